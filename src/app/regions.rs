//! UI regions - independently built components that only talk through the bus
//!
//! Each region is shared as `Rc<RefCell<_>>` between the app actor (which
//! reads it to build a [`RenderState`](crate::messages::RenderState)) and the
//! bus handlers it registers in `subscribe`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ratatui::text::Line;

use crate::bus::{AppEvent, EventBus, Topic};
use crate::constants::DEFAULT_URL;
use crate::highlight::{Highlighter, THEMES};
use crate::models::{header_rows, Header, HeaderMap, HttpMethod, RequestInput, RequestResponse};
use crate::storage::{HistoryKeys, HistoryStore, Settings, SettingsStore, StorageResult};

// ========================
// Path bar
// ========================

/// Method, URL, body and header rows of the request being composed
#[derive(Clone, Debug, PartialEq)]
pub struct PathBar {
    pub method: HttpMethod,
    pub url: String,
    pub body: String,
    pub headers: Vec<Header>,
    /// Set while the send control is disabled
    pub sending: bool,
}

impl Default for PathBar {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBar {
    pub fn new() -> Self {
        PathBar {
            method: HttpMethod::GET,
            url: String::from(DEFAULT_URL),
            body: String::new(),
            headers: vec![Header::new("Accept", "*/*")],
            sending: false,
        }
    }

    /// Blank request; the send control keeps its state
    pub fn reset(&mut self) {
        let sending = self.sending;
        *self = PathBar { sending, ..PathBar::new() };
    }

    pub fn load(&mut self, request: &RequestInput) {
        self.method = request.method;
        self.url = request.path.clone();
        self.body = request.body.clone();
        self.headers = header_rows(&request.headers);
    }

    pub fn cycle_method(&mut self) {
        self.method = self.method.next();
    }

    pub fn subscribe(this: &Rc<RefCell<Self>>, bus: &mut EventBus) {
        let bar = Rc::clone(this);
        bus.subscribe(Topic::RequestLoaded, move |event| {
            if let AppEvent::RequestLoaded(record) = event {
                bar.borrow_mut().load(&record.request);
            }
        });

        let bar = Rc::clone(this);
        bus.subscribe(Topic::RequestNew, move |_| bar.borrow_mut().reset());
    }
}

// ========================
// Response viewer
// ========================

pub struct ResponseView {
    pub status: Option<u16>,
    pub duration: Option<Duration>,
    pub headers: HeaderMap,
    pub lines: Vec<Line<'static>>,
    pub scroll: u16,
    /// Syntax highlighting switch; off shows bodies as received
    pub highlight: bool,
    theme: String,
    highlighter: Highlighter,
    history: Rc<HistoryStore>,
}

impl ResponseView {
    pub fn new(history: Rc<HistoryStore>, theme: &str) -> Self {
        ResponseView {
            status: None,
            duration: None,
            headers: HeaderMap::new(),
            lines: Vec::new(),
            scroll: 0,
            highlight: true,
            theme: theme.to_string(),
            highlighter: Highlighter::new(),
            history,
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn show(&mut self, record: &RequestResponse) {
        let response = &record.response;
        self.status = Some(response.status_code);
        self.duration = Some(response.duration);
        self.headers = response.headers.clone();
        self.lines = self.highlighter.render(
            response.content_type(),
            &response.response_body,
            &self.theme,
            self.highlight,
        );
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.status = None;
        self.duration = None;
        self.headers.clear();
        self.lines.clear();
        self.scroll = 0;
    }

    /// Switch theme and redraw the active record from memory
    pub fn apply_theme(&mut self, theme: &str) {
        if theme != self.theme {
            self.theme = theme.to_string();
            self.highlighter.invalidate();
        }

        self.rerender();
    }

    /// Flip highlighting and redraw the active record from memory
    pub fn toggle_highlight(&mut self) {
        self.highlight = !self.highlight;
        self.rerender();
    }

    fn rerender(&mut self) {
        if let Some(record) = self.history.active_record() {
            let response = &record.response;
            self.lines = self.highlighter.render(
                response.content_type(),
                &response.response_body,
                &self.theme,
                self.highlight,
            );
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn subscribe(this: &Rc<RefCell<Self>>, bus: &mut EventBus) {
        let view = Rc::clone(this);
        bus.subscribe(Topic::RequestCompleted, move |event| {
            if let AppEvent::RequestCompleted(record) = event {
                view.borrow_mut().show(record);
            }
        });

        let view = Rc::clone(this);
        bus.subscribe(Topic::RequestLoaded, move |event| {
            if let AppEvent::RequestLoaded(record) = event {
                view.borrow_mut().show(record);
            }
        });

        let view = Rc::clone(this);
        bus.subscribe(Topic::RequestNew, move |_| view.borrow_mut().clear());

        let view = Rc::clone(this);
        bus.subscribe(Topic::PreferencesUpdated, move |event| {
            if let AppEvent::PreferencesUpdated(settings) = event {
                view.borrow_mut().apply_theme(settings.theme());
            }
        });
    }
}

// ========================
// History sidebar
// ========================

/// One line of the sidebar
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub key: String,
    pub method: HttpMethod,
    pub path: String,
    pub status: u16,
}

impl HistoryRow {
    fn new(key: String, record: &RequestResponse) -> Self {
        HistoryRow {
            key,
            method: record.request.method,
            path: record.request.path.clone(),
            status: record.response.status_code,
        }
    }
}

/// Newest-first list of stored exchanges
pub struct HistorySidebar {
    pub rows: Vec<HistoryRow>,
    pub selected: Option<usize>,
    keys: HistoryKeys,
    store: Rc<HistoryStore>,
    error: Option<String>,
}

impl HistorySidebar {
    pub fn new(store: Rc<HistoryStore>) -> Self {
        HistorySidebar {
            rows: Vec::new(),
            selected: None,
            keys: HistoryKeys::new(),
            store,
            error: None,
        }
    }

    /// Rebuild the rows from the store
    pub fn reload(&mut self) -> StorageResult<()> {
        let mut entries = self.store.list_all()?;
        entries.sort_by(|a, b| b.key.cmp(&a.key));
        self.rows = entries
            .into_iter()
            .map(|entry| HistoryRow::new(entry.key, &entry.record))
            .collect();
        self.selected = None;
        Ok(())
    }

    /// Storage failure raised by a bus handler since the last call
    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    pub fn selected_key(&self) -> Option<String> {
        self.selected
            .and_then(|i| self.rows.get(i))
            .map(|row| row.key.clone())
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(self.rows.len() - 1),
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
    }

    /// Delete the selected entry from the store, then from the list
    pub fn delete_selected(&mut self) -> StorageResult<()> {
        let Some(index) = self.selected.filter(|&i| i < self.rows.len()) else {
            return Ok(());
        };
        self.store.delete(&self.rows[index].key)?;
        let removed = self.rows.remove(index);
        tracing::info!(key = %removed.key, "History entry deleted");

        self.selected = match self.rows.len() {
            0 => None,
            len => Some(index.min(len - 1)),
        };
        Ok(())
    }

    fn on_completed(&mut self, record: &RequestResponse) {
        let key = self.keys.next_key();
        match self.store.write(&key, record) {
            Ok(()) => {
                tracing::info!(%key, status = record.response.status_code, "History entry written");
                self.rows.insert(0, HistoryRow::new(key, record));
                self.selected = None;
            }
            Err(e) => {
                tracing::error!(%key, error = %e, "Failed to write history entry");
                self.error = Some(format!("Could not save history entry: {e}"));
            }
        }
        self.store.set_active_record(Some(record.clone()));
    }

    fn on_cleared(&mut self) {
        match self.store.delete_all() {
            Ok(removed) => {
                tracing::info!(removed, "History cleared");
                self.rows.clear();
                self.selected = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to clear history");
                self.error = Some(format!("Could not clear history: {e}"));
            }
        }
    }

    pub fn subscribe(this: &Rc<RefCell<Self>>, bus: &mut EventBus) {
        let sidebar = Rc::clone(this);
        bus.subscribe(Topic::RequestCompleted, move |event| {
            if let AppEvent::RequestCompleted(record) = event {
                sidebar.borrow_mut().on_completed(record);
            }
        });

        let sidebar = Rc::clone(this);
        bus.subscribe(Topic::RequestLoaded, move |event| {
            if let AppEvent::RequestLoaded(record) = event {
                sidebar.borrow().store.set_active_record(Some(record.clone()));
            }
        });

        let sidebar = Rc::clone(this);
        bus.subscribe(Topic::RequestNew, move |_| {
            let mut sidebar = sidebar.borrow_mut();
            sidebar.selected = None;
            sidebar.store.set_active_record(None);
        });

        let sidebar = Rc::clone(this);
        bus.subscribe(Topic::HistoryClear, move |_| sidebar.borrow_mut().on_cleared());
    }
}

// ========================
// Settings dialog
// ========================

pub struct SettingsDialog {
    pub open: bool,
    pub current: Settings,
    pub draft_theme: usize,
    pub draft_check_updates: bool,
    store: Rc<SettingsStore>,
    error: Option<String>,
}

impl SettingsDialog {
    pub fn new(store: Rc<SettingsStore>, current: Settings) -> Self {
        SettingsDialog {
            open: false,
            draft_theme: theme_index(current.theme()),
            draft_check_updates: current.check_updates(),
            current,
            store,
            error: None,
        }
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    pub fn draft_theme_name(&self) -> &'static str {
        THEMES[self.draft_theme % THEMES.len()]
    }

    pub fn next_theme(&mut self) {
        self.draft_theme = (self.draft_theme + 1) % THEMES.len();
    }

    pub fn prev_theme(&mut self) {
        self.draft_theme = (self.draft_theme + THEMES.len() - 1) % THEMES.len();
    }

    pub fn toggle_check_updates(&mut self) {
        self.draft_check_updates = !self.draft_check_updates;
    }

    /// Replacement snapshot built from the dialog's fields
    pub fn draft(&self) -> Settings {
        let mut snapshot = self.current.clone();
        for (key, value) in Settings::snapshot(self.draft_theme_name(), self.draft_check_updates).iter() {
            snapshot.set(key.clone(), value.clone());
        }
        snapshot
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn on_show(&mut self) {
        self.draft_theme = theme_index(self.current.theme());
        self.draft_check_updates = self.current.check_updates();
        self.open = true;
    }

    fn on_updated(&mut self, settings: &Settings) {
        self.current = settings.clone();
        self.open = false;
        if let Err(e) = self.store.apply(settings) {
            tracing::error!(error = %e, "Failed to persist settings");
            self.error = Some(format!("Could not save preferences: {e}"));
        }
    }

    pub fn subscribe(this: &Rc<RefCell<Self>>, bus: &mut EventBus) {
        let dialog = Rc::clone(this);
        bus.subscribe(Topic::PreferencesShow, move |_| dialog.borrow_mut().on_show());

        let dialog = Rc::clone(this);
        bus.subscribe(Topic::PreferencesUpdated, move |event| {
            if let AppEvent::PreferencesUpdated(settings) = event {
                dialog.borrow_mut().on_updated(settings);
            }
        });
    }
}

fn theme_index(theme: &str) -> usize {
    THEMES.iter().position(|t| *t == theme).unwrap_or(0)
}
