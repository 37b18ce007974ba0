//! Courier - terminal HTTP request tester
//!
//! Architecture:
//! - UI thread (Ratatui) - synchronous terminal rendering
//! - App actor - owns the event bus, regions and stores on the main task
//! - Network tasks (Tokio) - one per request

use std::ffi::OsStr;
use std::io;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;

use courier_tui::app::state::NoticeKind;
use courier_tui::constants::{APP_NAME, APP_VERSION, LOG_FILE_NAME};
use courier_tui::highlight::THEMES;
use courier_tui::messages::ui_events::{key_to_ui_event, InputMode, Modal, Panel};
use courier_tui::ui::{border_style, centered_rect, method_color, render_tabs, status_color};
use courier_tui::{
    AppActor, Config, Database, Dispatcher, NetworkResponse, RenderState, ReqwestClient, UiEvent,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.ensure_data_dir()?;

    // Initialize logging to file
    let log_dir = config.log_path.parent().unwrap_or(config.data_dir.as_path());
    let log_file = config.log_path.file_name().unwrap_or(OsStr::new(LOG_FILE_NAME));
    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(version = APP_VERSION, data_dir = %config.data_dir.display(), "Starting");

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_tx, net_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, render_rx) = mpsc::unbounded_channel::<RenderState>();

    let mut dispatcher = Dispatcher::new(ReqwestClient::new(), net_tx);
    if let Some(limit) = config.max_in_flight {
        tracing::info!(limit, "Capping concurrent requests");
        dispatcher = dispatcher.with_limit(limit);
    }
    let actor = AppActor::new(db, dispatcher, render_tx);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let guard = TerminalGuard;

    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    let ui_thread = thread::Builder::new()
        .name("courier-ui".into())
        .spawn(move || run_ui_loop(terminal, ui_tx, render_rx))
        .context("spawning UI thread")?;

    // The actor holds `Rc` state, so it stays on this task
    actor.run(ui_rx, net_rx).await;

    let result = ui_thread
        .join()
        .map_err(|_| anyhow::anyhow!("UI thread panicked"))?;
    drop(guard);
    tracing::info!("Shut down");
    result
}

/// Run the synchronous UI rendering loop
fn run_ui_loop(
    mut terminal: Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    mut render_rx: mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_panel,
                    current_state.input_mode,
                    current_state.modal,
                ) {
                    let quit = event == UiEvent::Quit;
                    if ui_tx.send(event).is_err() || quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(rows[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Method + URL
            Constraint::Length(8), // Body / Headers
            Constraint::Min(5),    // Response
        ])
        .split(columns[0]);

    draw_url_bar(f, state, main[0]);
    draw_middle_panels(f, state, main[1]);
    draw_response(f, state, main[2]);
    draw_history(f, state, columns[1]);
    draw_status_bar(f, state, rows[1]);

    match state.modal {
        Modal::None => {}
        Modal::Help => draw_help_popup(f, area),
        Modal::Notice => draw_notice_popup(f, state, area),
        Modal::ConfirmClear => draw_confirm_popup(f, area),
        Modal::Settings => draw_settings_popup(f, state, area),
    }
}

fn is_editing(state: &RenderState, panel: Panel) -> bool {
    state.active_panel == panel && state.input_mode == InputMode::Editing
}

fn set_cursor(f: &mut Frame, state: &RenderState, area: Rect) {
    let max_x = area.x + area.width.saturating_sub(2);
    let column = state.edit_buffer[..state.cursor_position.min(state.edit_buffer.len())]
        .chars()
        .count() as u16;
    let cursor_x = (area.x + column + 1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, area.y + 1));
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.active_panel == Panel::Url;
    let sending = if state.sending { " [sending]" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused, is_editing(state, Panel::Url)))
        .title(format!(" {}{} ", state.method.as_str(), sending))
        .title_style(Style::default().fg(method_color(state.method)).bold());

    let input = Paragraph::new(state.field_text(Panel::Url)).block(block);
    f.render_widget(input, area);

    if is_editing(state, Panel::Url) {
        set_cursor(f, state, area);
    }
}

fn draw_middle_panels(f: &mut Frame, state: &RenderState, area: Rect) {
    let tabs_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let selected_tab = if state.active_panel == Panel::Headers { 1 } else { 0 };
    f.render_widget(render_tabs(&["Body", "Headers"], selected_tab), tabs_area[0]);

    if selected_tab == 1 {
        draw_headers_panel(f, state, tabs_area[1]);
    } else {
        draw_body_panel(f, state, tabs_area[1]);
    }
}

fn draw_body_panel(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.active_panel == Panel::Body;
    let title = if state.method.has_body() {
        " Body "
    } else {
        " Body (not sent with GET/HEAD) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused, is_editing(state, Panel::Body)))
        .title(title);

    let body = Paragraph::new(state.field_text(Panel::Body))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(body, area);

    if is_editing(state, Panel::Body) {
        set_cursor(f, state, area);
    }
}

fn draw_headers_panel(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.active_panel == Panel::Headers;
    let editing = is_editing(state, Panel::Headers);

    let items: Vec<ListItem> = state
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let selected = focused && i == state.selected_header;
            if selected && editing {
                return ListItem::new(format!("[~] {}", state.edit_buffer))
                    .style(Style::default().fg(Color::Yellow));
            }
            let style = if !h.enabled {
                Style::default().fg(Color::DarkGray)
            } else if selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            let prefix = if h.enabled { "[x]" } else { "[ ]" };
            ListItem::new(format!("{} {}: {}", prefix, h.key, h.value)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(focused, editing))
            .title(" Headers (a:add d:del e:edit Enter:toggle) "),
    );
    f.render_widget(list, area);
}

fn draw_response(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.active_panel == Panel::Response;

    let status_text = match state.status {
        Some(code) => Span::styled(format!(" {} ", code), Style::default().fg(status_color(code)).bold()),
        None => Span::raw(" Response "),
    };
    let time_text = state
        .duration
        .map(|d| format!(" {}ms ", d.as_millis()))
        .unwrap_or_default();

    let highlight_text = if state.highlight { " highlight: on " } else { " highlight: off " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused, false))
        .title(status_text)
        .title_bottom(Line::from(highlight_text).left_aligned())
        .title_bottom(Line::from(time_text).right_aligned());

    let mut lines: Vec<Line> = state
        .response_headers
        .iter()
        .flat_map(|(name, values)| {
            values.iter().map(move |v| {
                Line::styled(format!("{name}: {v}"), Style::default().fg(Color::DarkGray))
            })
        })
        .collect();
    if !lines.is_empty() {
        lines.push(Line::raw(""));
    }
    lines.extend(state.response_lines.iter().cloned());

    let response = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.response_scroll, 0));
    f.render_widget(response, area);
}

fn draw_history(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.active_panel == Panel::History;

    let items: Vec<ListItem> = state
        .history
        .iter()
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:6}", row.method.as_str()), Style::default().fg(method_color(row.method)).bold()),
                Span::styled(format!(" {} ", row.status), Style::default().fg(status_color(row.status))),
                Span::raw(row.path.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(focused, false))
                .title(format!(" History ({}) ", state.history.len())),
        )
        .highlight_style(if focused {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().bold()
        });

    let mut list_state = ListState::default();
    list_state.select(state.selected_history);
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = if state.input_mode == InputMode::Editing {
        String::from(" ESC:stop editing | arrows:move | Enter:done (sends from URL) ")
    } else {
        let in_flight = if state.in_flight > 0 {
            format!(" [{} in flight]", state.in_flight)
        } else {
            String::new()
        };
        format!(" Tab:panel | e:edit | m:method | s:send | n:new | p:prefs | ?:help | q:quit{in_flight} ")
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);

    let help_text = r#"
 COURIER - Keyboard Shortcuts

 NAVIGATION
   Tab / Shift+Tab    Switch panels
   ↑ / ↓              Scroll response / move in headers and history

 REQUEST
   m                  Cycle HTTP method
   s                  Send request
   Enter (in URL)     Send request while editing the URL
   e                  Edit current field
   n                  New request

 HEADERS
   a / d              Add / delete header
   Enter              Toggle header enabled

 HISTORY
   Enter              Load entry
   d                  Delete entry
   x                  Clear history

 GENERAL
   p                  Preferences
   h                  Toggle syntax highlighting
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {APP_NAME} {APP_VERSION} "))
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text).block(block).wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_notice_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(notice) = &state.notice else { return };
    let popup_area = centered_rect(60, 25, area);

    let color = match notice.kind {
        NoticeKind::Error => Color::Red,
        NoticeKind::Info => Color::Cyan,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", notice.title))
        .title_bottom(Line::from(" Enter to close ").right_aligned())
        .style(Style::default().bg(Color::Black));

    let text = Paragraph::new(notice.message.as_str())
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}

fn draw_confirm_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 20, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Clear history ")
        .style(Style::default().bg(Color::Black));

    let text = Paragraph::new("\n Delete every saved request? (y/n)").block(block);

    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}

fn draw_settings_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(50, 50, area);

    let mut lines = vec![Line::from(" Theme (↑/↓)").bold()];
    for theme in THEMES {
        let marker = if theme == state.settings_theme { "(*)" } else { "( )" };
        lines.push(Line::from(format!("   {marker} {theme}")));
    }
    lines.push(Line::raw(""));
    let check = if state.settings_check_updates { "[x]" } else { "[ ]" };
    lines.push(Line::from(format!(" {check} Check for updates on start-up (u)")));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Preferences ")
        .title_bottom(Line::from(" Enter:save Esc:cancel ").right_aligned())
        .style(Style::default().bg(Color::Black));

    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}
