//! App actor - message loop processing UI events and network responses
//!
//! The actor is the only place UI regions and the event bus are touched.
//! Background request tasks report back over `net_rx`; their outcomes are
//! published from here.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::mpsc;

use crate::app::commands::validate_request;
use crate::app::regions::{HistorySidebar, PathBar, ResponseView, SettingsDialog};
use crate::app::state::AppState;
use crate::bus::{AppEvent, EventBus};
use crate::constants::{APP_NAME, APP_VERSION};
use crate::messages::ui_events::InputMode;
use crate::messages::{NetworkResponse, RenderState, UiEvent};
use crate::models::RequestResponse;
use crate::network::{update, Dispatcher, HttpClient};
use crate::storage::{Database, HistoryStore, Settings, SettingsStore};

pub struct AppActor<C: HttpClient> {
    state: AppState,
    bus: EventBus,
    path_bar: Rc<RefCell<PathBar>>,
    response: Rc<RefCell<ResponseView>>,
    sidebar: Rc<RefCell<HistorySidebar>>,
    settings: Rc<RefCell<SettingsDialog>>,
    history: Rc<HistoryStore>,
    dispatcher: Dispatcher<C>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl<C: HttpClient> AppActor<C> {
    /// Build every region over one shared database and wire them to the bus
    pub fn new(
        db: Database,
        dispatcher: Dispatcher<C>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let mut state = AppState::new();
        let history = Rc::new(HistoryStore::new(db.clone()));
        let settings_store = Rc::new(SettingsStore::new(db));

        let current = settings_store.list_all().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load settings, using defaults");
            state.show_error("Storage error", format!("Could not load preferences: {e}"));
            Settings::new()
        });

        let mut sidebar = HistorySidebar::new(Rc::clone(&history));
        if let Err(e) = sidebar.reload() {
            tracing::error!(error = %e, "Failed to load history");
            state.show_error("Storage error", format!("Could not load history: {e}"));
        }

        let path_bar = Rc::new(RefCell::new(PathBar::new()));
        let response = Rc::new(RefCell::new(ResponseView::new(Rc::clone(&history), current.theme())));
        let sidebar = Rc::new(RefCell::new(sidebar));
        let settings = Rc::new(RefCell::new(SettingsDialog::new(settings_store, current)));

        let mut bus = EventBus::new();
        PathBar::subscribe(&path_bar, &mut bus);
        ResponseView::subscribe(&response, &mut bus);
        HistorySidebar::subscribe(&sidebar, &mut bus);
        SettingsDialog::subscribe(&settings, &mut bus);

        AppActor {
            state,
            bus,
            path_bar,
            response,
            sidebar,
            settings,
            history,
            dispatcher,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        self.check_for_updates();
        self.emit_render();

        loop {
            tokio::select! {
                event = ui_rx.recv() => {
                    let Some(event) = event else { break };
                    if self.handle_ui_event(event) {
                        break;
                    }
                }
                Some(response) = net_rx.recv() => self.handle_response(response),
            }
            self.emit_render();
        }

        tracing::info!(in_flight = self.dispatcher.in_flight(), "App actor stopped");
    }

    /// Start the background version check if the user opted in
    pub fn check_for_updates(&self) {
        if self.settings.borrow().current.check_updates() {
            tracing::info!("Checking for updates");
            update::spawn_check(
                self.dispatcher.client(),
                APP_VERSION,
                self.dispatcher.response_sender(),
            );
        }
    }

    /// Handle a UI event, returns true if quit was requested
    pub fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),
            UiEvent::ScrollUp => self.response.borrow_mut().scroll_up(),
            UiEvent::ScrollDown => self.response.borrow_mut().scroll_down(),
            UiEvent::ToggleHighlight => self.response.borrow_mut().toggle_highlight(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(&self.path_bar.borrow()),
            UiEvent::StopEditing => self.state.stop_editing(&mut self.path_bar.borrow_mut()),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Request actions
            UiEvent::SendRequest => {
                if self.path_bar.borrow().sending {
                    tracing::debug!("Send control disabled, ignoring");
                } else {
                    self.state.stop_editing(&mut self.path_bar.borrow_mut());
                    self.send_request();
                }
            }
            UiEvent::SubmitUrl => {
                self.state.stop_editing(&mut self.path_bar.borrow_mut());
                self.send_request();
            }
            UiEvent::CycleMethod => {
                let mut bar = self.path_bar.borrow_mut();
                if !bar.sending {
                    bar.cycle_method();
                }
            }
            UiEvent::NewRequest => {
                self.state.discard_editing();
                self.state.selected_header = 0;
                self.publish(AppEvent::RequestNew);
            }

            // Headers
            UiEvent::NextHeader => self.state.next_header(&self.path_bar.borrow()),
            UiEvent::PrevHeader => self.state.prev_header(&self.path_bar.borrow()),
            UiEvent::ToggleHeader => self.state.toggle_header(&mut self.path_bar.borrow_mut()),
            UiEvent::AddHeader => self.state.add_header(&mut self.path_bar.borrow_mut()),
            UiEvent::DeleteHeader => self.state.delete_header(&mut self.path_bar.borrow_mut()),

            // History
            UiEvent::HistoryUp => self.sidebar.borrow_mut().select_prev(),
            UiEvent::HistoryDown => self.sidebar.borrow_mut().select_next(),
            UiEvent::SelectHistory => self.load_selected(),
            UiEvent::DeleteHistory => {
                let deleted = self.sidebar.borrow_mut().delete_selected();
                if let Err(e) = deleted {
                    tracing::error!(error = %e, "Failed to delete history entry");
                    self.state.show_error("Storage error", format!("Could not delete entry: {e}"));
                }
            }
            UiEvent::ClearHistory => self.state.confirm_clear = true,
            UiEvent::ConfirmClear => {
                self.state.confirm_clear = false;
                self.publish(AppEvent::HistoryClear);
            }
            UiEvent::CancelClear => self.state.confirm_clear = false,

            // Preferences
            UiEvent::OpenSettings => self.publish(AppEvent::PreferencesShow),
            UiEvent::SettingsNextTheme => self.settings.borrow_mut().next_theme(),
            UiEvent::SettingsPrevTheme => self.settings.borrow_mut().prev_theme(),
            UiEvent::SettingsToggleUpdates => self.settings.borrow_mut().toggle_check_updates(),
            UiEvent::SaveSettings => {
                let snapshot = self.settings.borrow().draft();
                self.publish(AppEvent::PreferencesUpdated(snapshot));
            }
            UiEvent::CloseSettings => self.settings.borrow_mut().close(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),
            UiEvent::DismissNotice => self.state.dismiss_notice(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }

    /// Marshaled outcome of a background task
    pub fn handle_response(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::Success { id, request, result } => {
                tracing::info!(id, status = result.status_code, url = %request.path, "Publishing completion");
                let record = RequestResponse {
                    request,
                    response: result,
                };
                self.publish(AppEvent::RequestCompleted(record));
                self.path_bar.borrow_mut().sending = false;
            }
            NetworkResponse::Error { id, error } => {
                tracing::warn!(id, %error, "Request failed");
                self.state.show_error("Request failed", error.to_string());
                self.path_bar.borrow_mut().sending = false;
            }
            NetworkResponse::UpdateChecked { latest: Some(version) } => {
                self.state.show_info(
                    "Update available",
                    format!("{APP_NAME} {version} is available (you have {APP_VERSION})."),
                );
            }
            NetworkResponse::UpdateChecked { latest: None } => {
                tracing::debug!("No newer version");
            }
        }
    }

    fn send_request(&mut self) {
        let validated = validate_request(&self.path_bar.borrow());
        let input = match validated {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(error = %e, "Request rejected before dispatch");
                self.state.show_error("Invalid request", e.to_string());
                return;
            }
        };

        self.path_bar.borrow_mut().sending = true;
        let id = self.dispatcher.dispatch(input);
        tracing::debug!(id, "Request dispatched");
    }

    fn load_selected(&mut self) {
        let selected = self.sidebar.borrow().selected_key();
        let Some(key) = selected else { return };

        match self.history.get(&key) {
            Ok(record) => {
                self.state.discard_editing();
                self.state.selected_header = 0;
                self.publish(AppEvent::RequestLoaded(record));
            }
            Err(e) => {
                tracing::error!(%key, error = %e, "Failed to load history entry");
                self.state.show_error("Storage error", format!("Could not load entry: {e}"));
            }
        }
    }

    /// Publish, then surface any storage failure a subscriber ran into
    fn publish(&mut self, event: AppEvent) {
        self.bus.publish(event);

        let errors = [
            self.sidebar.borrow_mut().take_error(),
            self.settings.borrow_mut().take_error(),
        ];
        if let Some(message) = errors.into_iter().flatten().last() {
            self.state.show_error("Storage error", message);
        }
    }

    fn emit_render(&mut self) {
        let snapshot = self.render_state();
        let _ = self.render_tx.send(snapshot);
    }

    /// Snapshot for the terminal thread
    pub fn render_state(&mut self) -> RenderState {
        let in_flight = self.dispatcher.in_flight();
        let bar = self.path_bar.borrow();
        let response = self.response.borrow();
        let sidebar = self.sidebar.borrow();
        let settings = self.settings.borrow();

        RenderState {
            method: bar.method,
            url: bar.url.clone(),
            body: bar.body.clone(),
            headers: bar.headers.clone(),
            sending: bar.sending,
            in_flight,
            active_panel: self.state.active_panel,
            input_mode: self.state.input_mode,
            edit_buffer: self.state.edit_buffer.clone(),
            cursor_position: self.state.cursor_position,
            selected_header: self.state.selected_header,
            status: response.status,
            duration: response.duration,
            response_headers: response.headers.clone(),
            response_lines: response.lines.clone(),
            response_scroll: response.scroll,
            highlight: response.highlight,
            history: sidebar.rows.clone(),
            selected_history: sidebar.selected,
            modal: self.state.modal(settings.open),
            notice: self.state.notice.clone(),
            settings_theme: settings.draft_theme_name().to_string(),
            settings_check_updates: settings.draft_check_updates,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.state.input_mode == InputMode::Editing
    }
}
