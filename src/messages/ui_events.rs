//! UI events - messages from the terminal thread to the app actor

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Panel navigation
    NextPanel,
    PrevPanel,
    ScrollUp,
    ScrollDown,
    ToggleHighlight,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,

    // Request actions
    /// The send control; ignored while it is disabled
    SendRequest,
    /// Enter pressed in the URL field; sends even while a request is in flight
    SubmitUrl,
    CycleMethod,
    NewRequest,

    // Headers
    NextHeader,
    PrevHeader,
    ToggleHeader,
    AddHeader,
    DeleteHeader,

    // History
    HistoryUp,
    HistoryDown,
    SelectHistory,
    DeleteHistory,
    ClearHistory,
    ConfirmClear,
    CancelClear,

    // Preferences
    OpenSettings,
    SettingsNextTheme,
    SettingsPrevTheme,
    SettingsToggleUpdates,
    SaveSettings,
    CloseSettings,

    // Popups
    ToggleHelp,
    CloseHelp,
    DismissNotice,

    // System
    Quit,
}

/// Focusable panel (needed for context-aware event mapping)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Panel {
    Url,
    Body,
    Headers,
    Response,
    History,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Url => Panel::Body,
            Panel::Body => Panel::Headers,
            Panel::Headers => Panel::Response,
            Panel::Response => Panel::History,
            Panel::History => Panel::Url,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Url => Panel::History,
            Panel::Body => Panel::Url,
            Panel::Headers => Panel::Body,
            Panel::Response => Panel::Headers,
            Panel::History => Panel::Response,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Popup currently capturing keys
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Modal {
    None,
    Help,
    Notice,
    ConfirmClear,
    Settings,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_panel: Panel,
    input_mode: InputMode,
    modal: Modal,
) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiEvent::Quit);
    }

    match modal {
        Modal::Help => return Some(UiEvent::CloseHelp),
        Modal::Notice => {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(UiEvent::DismissNotice),
                _ => None,
            }
        }
        Modal::ConfirmClear => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Some(UiEvent::ConfirmClear),
                KeyCode::Char('n') | KeyCode::Esc => Some(UiEvent::CancelClear),
                _ => None,
            }
        }
        Modal::Settings => {
            return match key.code {
                KeyCode::Down | KeyCode::Right | KeyCode::Char('t') => Some(UiEvent::SettingsNextTheme),
                KeyCode::Up | KeyCode::Left => Some(UiEvent::SettingsPrevTheme),
                KeyCode::Char('u') | KeyCode::Char(' ') => Some(UiEvent::SettingsToggleUpdates),
                KeyCode::Enter | KeyCode::Char('s') => Some(UiEvent::SaveSettings),
                KeyCode::Esc => Some(UiEvent::CloseSettings),
                _ => None,
            }
        }
        Modal::None => {}
    }

    match input_mode {
        InputMode::Normal => normal_keys(key, active_panel),
        InputMode::Editing => match key.code {
            KeyCode::Esc => Some(UiEvent::StopEditing),
            KeyCode::Left => Some(UiEvent::CursorLeft),
            KeyCode::Right => Some(UiEvent::CursorRight),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            KeyCode::Enter if active_panel == Panel::Url => Some(UiEvent::SubmitUrl),
            KeyCode::Enter => Some(UiEvent::StopEditing),
            _ => None,
        },
    }
}

fn normal_keys(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Tab => Some(UiEvent::NextPanel),
        KeyCode::BackTab => Some(UiEvent::PrevPanel),
        KeyCode::Char('m') => Some(UiEvent::CycleMethod),
        KeyCode::Char('s') => Some(UiEvent::SendRequest),
        KeyCode::Char('n') => Some(UiEvent::NewRequest),
        KeyCode::Char('p') => Some(UiEvent::OpenSettings),
        KeyCode::Char('h') => Some(UiEvent::ToggleHighlight),
        KeyCode::Char('e') => match active_panel {
            Panel::Url | Panel::Body | Panel::Headers => Some(UiEvent::StartEditing),
            _ => None,
        },
        KeyCode::Enter => match active_panel {
            Panel::Url | Panel::Body => Some(UiEvent::StartEditing),
            Panel::Headers => Some(UiEvent::ToggleHeader),
            Panel::History => Some(UiEvent::SelectHistory),
            Panel::Response => None,
        },
        KeyCode::Up => match active_panel {
            Panel::Headers => Some(UiEvent::PrevHeader),
            Panel::Response => Some(UiEvent::ScrollUp),
            Panel::History => Some(UiEvent::HistoryUp),
            _ => None,
        },
        KeyCode::Down => match active_panel {
            Panel::Headers => Some(UiEvent::NextHeader),
            Panel::Response => Some(UiEvent::ScrollDown),
            Panel::History => Some(UiEvent::HistoryDown),
            _ => None,
        },
        KeyCode::Char('a') if active_panel == Panel::Headers => Some(UiEvent::AddHeader),
        KeyCode::Char('d') if active_panel == Panel::Headers => Some(UiEvent::DeleteHeader),
        KeyCode::Char('d') if active_panel == Panel::History => Some(UiEvent::DeleteHistory),
        KeyCode::Char('x') if active_panel == Panel::History => Some(UiEvent::ClearHistory),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn map(code: KeyCode, panel: Panel, mode: InputMode) -> Option<UiEvent> {
        key_to_ui_event(press(code), panel, mode, Modal::None)
    }

    #[test]
    fn enter_in_url_field_submits() {
        assert_eq!(
            map(KeyCode::Enter, Panel::Url, InputMode::Editing),
            Some(UiEvent::SubmitUrl)
        );
        assert_eq!(
            map(KeyCode::Enter, Panel::Body, InputMode::Editing),
            Some(UiEvent::StopEditing)
        );
    }

    #[test]
    fn panel_specific_keys() {
        assert_eq!(
            map(KeyCode::Char('d'), Panel::History, InputMode::Normal),
            Some(UiEvent::DeleteHistory)
        );
        assert_eq!(
            map(KeyCode::Char('d'), Panel::Headers, InputMode::Normal),
            Some(UiEvent::DeleteHeader)
        );
        assert_eq!(map(KeyCode::Char('d'), Panel::Url, InputMode::Normal), None);
        assert_eq!(
            map(KeyCode::Enter, Panel::History, InputMode::Normal),
            Some(UiEvent::SelectHistory)
        );
    }

    #[test]
    fn h_toggles_highlighting_outside_editing() {
        assert_eq!(
            map(KeyCode::Char('h'), Panel::Response, InputMode::Normal),
            Some(UiEvent::ToggleHighlight)
        );
        assert_eq!(
            map(KeyCode::Char('h'), Panel::Body, InputMode::Editing),
            Some(UiEvent::CharInput('h'))
        );
    }

    #[test]
    fn typing_q_while_editing_is_text() {
        assert_eq!(
            map(KeyCode::Char('q'), Panel::Url, InputMode::Editing),
            Some(UiEvent::CharInput('q'))
        );
    }

    #[test]
    fn popups_capture_keys() {
        let event = |code, modal| key_to_ui_event(press(code), Panel::Url, InputMode::Normal, modal);

        assert_eq!(event(KeyCode::Char('s'), Modal::Help), Some(UiEvent::CloseHelp));
        assert_eq!(event(KeyCode::Char('s'), Modal::Notice), None);
        assert_eq!(event(KeyCode::Enter, Modal::Notice), Some(UiEvent::DismissNotice));
        assert_eq!(event(KeyCode::Char('y'), Modal::ConfirmClear), Some(UiEvent::ConfirmClear));
        assert_eq!(event(KeyCode::Esc, Modal::ConfirmClear), Some(UiEvent::CancelClear));
        assert_eq!(event(KeyCode::Char('s'), Modal::Settings), Some(UiEvent::SaveSettings));
    }

    #[test]
    fn ctrl_c_always_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            key_to_ui_event(key, Panel::Body, InputMode::Editing, Modal::Settings),
            Some(UiEvent::Quit)
        );
    }
}
