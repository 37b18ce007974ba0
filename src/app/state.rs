//! App state - focus, editing and modal state owned by the actor
//!
//! Request data lives in the [`PathBar`](crate::app::regions::PathBar) region;
//! this struct only tracks what the user is interacting with.

use crate::messages::ui_events::{InputMode, Modal, Panel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// Modal message shown until dismissed
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

pub struct AppState {
    pub active_panel: Panel,
    pub input_mode: InputMode,

    // Field being edited and its cursor (byte offset)
    pub edit_buffer: String,
    pub cursor_position: usize,

    pub selected_header: usize,

    // Popups
    pub notice: Option<Notice>,
    pub confirm_clear: bool,
    pub show_help: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            active_panel: Panel::Url,
            input_mode: InputMode::Normal,
            edit_buffer: String::new(),
            cursor_position: 0,
            selected_header: 0,
            notice: None,
            confirm_clear: false,
            show_help: false,
        }
    }

    pub fn show_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn show_info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        });
    }

    /// Top-most popup; the settings dialog's open flag lives in its region
    pub fn modal(&self, settings_open: bool) -> Modal {
        if self.notice.is_some() {
            Modal::Notice
        } else if self.confirm_clear {
            Modal::ConfirmClear
        } else if settings_open {
            Modal::Settings
        } else if self.show_help {
            Modal::Help
        } else {
            Modal::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_outranks_other_popups() {
        let mut state = AppState::new();
        assert_eq!(state.modal(false), Modal::None);

        state.show_help = true;
        assert_eq!(state.modal(false), Modal::Help);
        assert_eq!(state.modal(true), Modal::Settings);

        state.confirm_clear = true;
        assert_eq!(state.modal(true), Modal::ConfirmClear);

        state.show_error("Request failed", "refused");
        assert_eq!(state.modal(true), Modal::Notice);
        assert_eq!(state.notice.as_ref().unwrap().kind, NoticeKind::Error);
    }
}
