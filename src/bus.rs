//! Event bus - the only channel through which UI regions observe each other
//!
//! Topics are derived from the event variant, so a payload can never be
//! published under the wrong topic. Delivery is synchronous, in registration
//! order, on the publishing thread. The bus is `!Send`: only the app actor
//! may publish or subscribe.

use std::collections::HashMap;

use crate::models::RequestResponse;
use crate::storage::Settings;

/// Routing key of an [`AppEvent`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    RequestCompleted,
    RequestLoaded,
    RequestNew,
    HistoryClear,
    PreferencesUpdated,
    PreferencesShow,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::RequestCompleted => "request:completed",
            Topic::RequestLoaded => "request:loaded",
            Topic::RequestNew => "request:new",
            Topic::HistoryClear => "history:clear",
            Topic::PreferencesUpdated => "preferences:updated",
            Topic::PreferencesShow => "preferences:show",
        }
    }
}

/// Every message that can travel over the bus
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    /// A dispatched request finished successfully
    RequestCompleted(RequestResponse),
    /// A history entry was selected
    RequestLoaded(RequestResponse),
    /// The user asked for a blank request
    RequestNew,
    /// The user confirmed wiping the history
    HistoryClear,
    /// A replacement settings snapshot was saved
    PreferencesUpdated(Settings),
    /// The preferences dialog should open
    PreferencesShow,
}

impl AppEvent {
    pub fn topic(&self) -> Topic {
        match self {
            AppEvent::RequestCompleted(_) => Topic::RequestCompleted,
            AppEvent::RequestLoaded(_) => Topic::RequestLoaded,
            AppEvent::RequestNew => Topic::RequestNew,
            AppEvent::HistoryClear => Topic::HistoryClear,
            AppEvent::PreferencesUpdated(_) => Topic::PreferencesUpdated,
            AppEvent::PreferencesShow => Topic::PreferencesShow,
        }
    }
}

pub type Handler = Box<dyn FnMut(&AppEvent)>;

#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<Topic, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; subscribing the same closure twice calls it twice
    pub fn subscribe(&mut self, topic: Topic, handler: impl FnMut(&AppEvent) + 'static) {
        self.handlers.entry(topic).or_default().push(Box::new(handler));
    }

    /// Call every handler of the event's topic, in registration order
    pub fn publish(&mut self, event: AppEvent) {
        let topic = event.topic();
        let Some(handlers) = self.handlers.get_mut(&topic) else {
            tracing::debug!(topic = topic.as_str(), "No subscribers");
            return;
        };

        tracing::debug!(topic = topic.as_str(), subscribers = handlers.len(), "Publishing");
        for handler in handlers.iter_mut() {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers.get(&topic).map_or(0, Vec::len)
    }
}
