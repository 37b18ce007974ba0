//! Render state - snapshot sent from the app actor to the terminal thread

use std::time::Duration;

use ratatui::text::Line;

use crate::app::regions::HistoryRow;
use crate::app::state::Notice;
use crate::constants::DEFAULT_URL;
use crate::highlight::DEFAULT_THEME;
use crate::messages::ui_events::{InputMode, Modal, Panel};
use crate::models::{Header, HeaderMap, HttpMethod};

/// Complete state needed by the UI to render
#[derive(Debug, Clone)]
pub struct RenderState {
    // Path bar
    pub method: HttpMethod,
    pub url: String,
    pub body: String,
    pub headers: Vec<Header>,
    pub sending: bool,
    pub in_flight: usize,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub edit_buffer: String,
    pub cursor_position: usize,
    pub selected_header: usize,

    // Response viewer
    pub status: Option<u16>,
    pub duration: Option<Duration>,
    pub response_headers: HeaderMap,
    pub response_lines: Vec<Line<'static>>,
    pub response_scroll: u16,
    pub highlight: bool,

    // History sidebar
    pub history: Vec<HistoryRow>,
    pub selected_history: Option<usize>,

    // Popups
    pub modal: Modal,
    pub notice: Option<Notice>,
    pub settings_theme: String,
    pub settings_check_updates: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            method: HttpMethod::GET,
            url: String::from(DEFAULT_URL),
            body: String::new(),
            headers: Vec::new(),
            sending: false,
            in_flight: 0,
            active_panel: Panel::Url,
            input_mode: InputMode::Normal,
            edit_buffer: String::new(),
            cursor_position: 0,
            selected_header: 0,
            status: None,
            duration: None,
            response_headers: HeaderMap::new(),
            response_lines: Vec::new(),
            response_scroll: 0,
            highlight: true,
            history: Vec::new(),
            selected_history: None,
            modal: Modal::None,
            notice: None,
            settings_theme: String::from(DEFAULT_THEME),
            settings_check_updates: false,
        }
    }
}

impl RenderState {
    /// Text shown in `panel`: the edit buffer while that panel is being edited
    pub fn field_text(&self, panel: Panel) -> &str {
        if self.input_mode == InputMode::Editing && self.active_panel == panel {
            return &self.edit_buffer;
        }
        match panel {
            Panel::Url => &self.url,
            Panel::Body => &self.body,
            _ => "",
        }
    }
}
