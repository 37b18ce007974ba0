//! Command handlers - editing, navigation and pre-dispatch validation

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::app::regions::PathBar;
use crate::app::AppState;
use crate::messages::ui_events::{InputMode, Panel};
use crate::models::{header_map, Header, RequestInput};

/// Reasons a request is refused before it reaches the network
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported scheme `{0}`, use http or https")]
    UnsupportedScheme(String),

    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),

    #[error("invalid value for header `{name}`")]
    InvalidHeaderValue { name: String },
}

/// Check the path bar and capture its inputs by value
pub fn validate_request(bar: &PathBar) -> Result<RequestInput, ValidationError> {
    let raw = bar.url.trim();
    let url = reqwest::Url::parse(raw).map_err(|e| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }

    for header in bar.headers.iter().filter(|h| h.enabled && !h.key.is_empty()) {
        HeaderName::from_bytes(header.key.as_bytes())
            .map_err(|_| ValidationError::InvalidHeaderName(header.key.clone()))?;
        HeaderValue::from_str(&header.value).map_err(|_| ValidationError::InvalidHeaderValue {
            name: header.key.clone(),
        })?;
    }

    Ok(RequestInput {
        method: bar.method,
        path: raw.to_string(),
        headers: header_map(&bar.headers),
        body: bar.body.clone(),
    })
}

impl AppState {
    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
    }

    // ========================
    // Input editing
    // ========================

    /// Copy the focused field into the edit buffer
    pub fn start_editing(&mut self, bar: &PathBar) {
        let text = match self.active_panel {
            Panel::Url => bar.url.clone(),
            Panel::Body => bar.body.clone(),
            Panel::Headers => match bar.headers.get(self.selected_header) {
                Some(h) => format!("{}: {}", h.key, h.value),
                None => return,
            },
            Panel::Response | Panel::History => return,
        };
        self.edit_buffer = text;
        self.cursor_position = self.edit_buffer.len();
        self.input_mode = InputMode::Editing;
    }

    /// Write the edit buffer back to the focused field
    pub fn stop_editing(&mut self, bar: &mut PathBar) {
        if self.input_mode != InputMode::Editing {
            return;
        }
        self.input_mode = InputMode::Normal;
        let text = std::mem::take(&mut self.edit_buffer);

        match self.active_panel {
            Panel::Url => bar.url = text,
            Panel::Body => bar.body = text,
            Panel::Headers => {
                if let Some(header) = bar.headers.get_mut(self.selected_header) {
                    let (key, value) = text.split_once(':').unwrap_or((text.as_str(), ""));
                    header.key = key.trim().to_string();
                    header.value = value.trim().to_string();
                }
            }
            Panel::Response | Panel::History => {}
        }
        self.cursor_position = 0;
    }

    /// Leave editing without touching the path bar
    pub fn discard_editing(&mut self) {
        self.input_mode = InputMode::Normal;
        self.edit_buffer.clear();
        self.cursor_position = 0;
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position = self.edit_buffer[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = &self.edit_buffer;
        if self.cursor_position < input.len() {
            self.cursor_position = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
        }
    }

    pub fn enter_char(&mut self, c: char) {
        if self.input_mode != InputMode::Editing {
            return;
        }
        let pos = self.cursor_position.min(self.edit_buffer.len());
        self.edit_buffer.insert(pos, c);
        self.cursor_position = pos + c.len_utf8();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let prev = self.edit_buffer[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.edit_buffer.remove(prev);
            self.cursor_position = prev;
        }
    }

    // ========================
    // Headers
    // ========================

    pub fn next_header(&mut self, bar: &PathBar) {
        if !bar.headers.is_empty() {
            self.selected_header = (self.selected_header + 1) % bar.headers.len();
        }
    }

    pub fn prev_header(&mut self, bar: &PathBar) {
        if !bar.headers.is_empty() {
            self.selected_header = self
                .selected_header
                .checked_sub(1)
                .unwrap_or(bar.headers.len() - 1);
        }
    }

    pub fn toggle_header(&mut self, bar: &mut PathBar) {
        if let Some(header) = bar.headers.get_mut(self.selected_header) {
            header.enabled = !header.enabled;
        }
    }

    pub fn add_header(&mut self, bar: &mut PathBar) {
        bar.headers.push(Header::new("X-Custom", "value"));
        self.selected_header = bar.headers.len() - 1;
    }

    pub fn delete_header(&mut self, bar: &mut PathBar) {
        if self.selected_header < bar.headers.len() {
            bar.headers.remove(self.selected_header);
            if self.selected_header > 0 && self.selected_header >= bar.headers.len() {
                self.selected_header -= 1;
            }
        }
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    fn bar(url: &str) -> PathBar {
        PathBar {
            url: url.to_string(),
            ..PathBar::new()
        }
    }

    #[test]
    fn valid_request_is_captured_by_value() {
        let mut bar = bar(" https://example.com/ok ");
        bar.method = HttpMethod::PUT;
        bar.body = "payload".into();
        bar.headers.push(Header::new("X-Trace", "1"));

        let input = validate_request(&bar).unwrap();
        assert_eq!(input.path, "https://example.com/ok");
        assert_eq!(input.method, HttpMethod::PUT);
        assert_eq!(input.body, "payload");
        assert_eq!(input.headers["X-Trace"], vec!["1"]);

        bar.body.push_str(" edited");
        assert_eq!(input.body, "payload");
    }

    #[test]
    fn malformed_urls_are_rejected() {
        assert!(matches!(
            validate_request(&bar("https://")),
            Err(ValidationError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_request(&bar("example.com")),
            Err(ValidationError::InvalidUrl { .. })
        ));
        assert_eq!(
            validate_request(&bar("ftp://example.com")),
            Err(ValidationError::UnsupportedScheme("ftp".into()))
        );
    }

    #[test]
    fn bad_headers_are_rejected_unless_disabled() {
        let mut bar = bar("http://localhost:8080");
        bar.headers.push(Header::new("bad header", "x"));
        assert_eq!(
            validate_request(&bar),
            Err(ValidationError::InvalidHeaderName("bad header".into()))
        );

        bar.headers.last_mut().unwrap().enabled = false;
        assert!(validate_request(&bar).is_ok());

        bar.headers.push(Header::new("X-Line", "a\nb"));
        assert_eq!(
            validate_request(&bar),
            Err(ValidationError::InvalidHeaderValue { name: "X-Line".into() })
        );
    }

    #[test]
    fn editing_commits_on_stop() {
        let mut state = AppState::new();
        let mut bar = bar("https://a");

        state.start_editing(&bar);
        state.enter_char('b');
        state.move_cursor_left();
        state.delete_char();
        assert_eq!(bar.url, "https://a");

        state.stop_editing(&mut bar);
        assert_eq!(bar.url, "https://b");
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[test]
    fn header_rows_are_edited_as_name_value() {
        let mut state = AppState::new();
        state.active_panel = Panel::Headers;
        let mut bar = PathBar::new();

        state.add_header(&mut bar);
        state.start_editing(&bar);
        assert_eq!(state.edit_buffer, "X-Custom: value");

        state.edit_buffer = "Authorization: Bearer a:b".into();
        state.stop_editing(&mut bar);
        assert_eq!(bar.headers[1], Header::new("Authorization", "Bearer a:b"));

        state.delete_header(&mut bar);
        assert_eq!(bar.headers.len(), 1);
        assert_eq!(state.selected_header, 0);
    }

    #[test]
    fn multibyte_cursor_moves_by_char() {
        let mut state = AppState::new();
        state.active_panel = Panel::Body;
        state.start_editing(&PathBar::new());
        for c in "ñé".chars() {
            state.enter_char(c);
        }
        state.move_cursor_left();
        assert_eq!(state.cursor_position, 2);
        state.move_cursor_right();
        assert_eq!(state.cursor_position, 4);
    }
}
