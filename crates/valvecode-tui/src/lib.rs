// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row as WidgetRow, Table as WidgetTable,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use valvecode_app::{AppCommand, AppState, LoadError, LoadStatus, Table};

const NO_CODE: &str = "—";
const PANEL_WINDOW: usize = 12;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

/// Everything the UI needs from the outside world.
pub trait AppRuntime {
    fn load_table(&mut self, category: &str) -> Result<Table, LoadError>;
    fn copy_code(&mut self, code: &str) -> Result<()>;

    /// Starts the load and reports through `tx`. The default runs inline;
    /// runtimes backed by the network override it with a thread.
    fn spawn_table_load(&mut self, category: &str, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.load_table(category);
        tx.send(InternalEvent::TableLoaded(result))
            .map_err(|_| anyhow!("load event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    TableLoaded(Result<Table, LoadError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PanelUiState {
    field: usize,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    cursor: usize,
    panel: Option<PanelUiState>,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    start_load(state, runtime, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn start_load<R: AppRuntime>(state: &mut AppState, runtime: &mut R, tx: &Sender<InternalEvent>) {
    let category = state.category.clone();
    if let Err(error) = runtime.spawn_table_load(&category, tx.clone()) {
        state.dispatch(AppCommand::SetStatus(format!(
            "could not start loading {category}: {error}"
        )));
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::TableLoaded(Ok(table)) => {
                let rows = table.len();
                state.dispatch(AppCommand::TableLoaded(table));
                view_data.panel = None;
                view_data.cursor = view_data.cursor.min(state.schema.len().saturating_sub(1));
                emit_status(state, view_data, tx, format!("loaded {rows} rows"));
            }
            InternalEvent::TableLoaded(Err(error)) => {
                state.dispatch(AppCommand::LoadFailed(error));
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.help_visible {
        view_data.help_visible = false;
        return false;
    }

    if let Some(panel) = view_data.panel {
        handle_panel_key(state, view_data, internal_tx, panel, key);
        return false;
    }

    let last_field = state.schema.len().saturating_sub(1);
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.cursor = (view_data.cursor + 1).min(last_field);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
        }
        KeyCode::Char('g') | KeyCode::Home => view_data.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => view_data.cursor = last_field,
        KeyCode::Enter | KeyCode::Char(' ') => open_panel(state, view_data),
        KeyCode::Char('x') | KeyCode::Delete => {
            clear_from_cursor(state, view_data, internal_tx);
        }
        KeyCode::Char('R') => {
            state.dispatch(AppCommand::ResetAll);
            tracing::debug!("selection reset");
            emit_status(state, view_data, internal_tx, "all selections cleared");
        }
        KeyCode::Char('y') => copy_code(state, runtime, view_data, internal_tx),
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn open_panel(state: &AppState, view_data: &mut ViewData) {
    if state.schema.get(view_data.cursor).is_none() {
        return;
    }
    let options = state.field_options(view_data.cursor);
    let cursor = state
        .selected_value(view_data.cursor)
        .and_then(|selected| options.iter().position(|value| value == selected))
        .unwrap_or(0);
    view_data.panel = Some(PanelUiState {
        field: view_data.cursor,
        cursor,
    });
}

fn close_panel(state: &mut AppState, view_data: &mut ViewData, field: usize) {
    state.dispatch(AppCommand::SetFilter {
        field,
        text: String::new(),
    });
    view_data.panel = None;
}

fn handle_panel_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mut panel: PanelUiState,
    key: KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            close_panel(state, view_data, panel.field);
            return;
        }
        KeyCode::Enter => {
            let options = state.field_options(panel.field);
            let Some(value) = options.get(panel.cursor).cloned() else {
                return;
            };
            let label = state
                .schema
                .get(panel.field)
                .map(|field| field.key.clone())
                .unwrap_or_default();
            state.dispatch(AppCommand::Select {
                field: panel.field,
                value: value.clone(),
            });
            view_data.panel = None;
            tracing::debug!(field = %label, %value, "field selected");
            emit_status(state, view_data, internal_tx, format!("{label} = {value}"));
            return;
        }
        KeyCode::Up => panel.cursor = panel.cursor.saturating_sub(1),
        KeyCode::Char('p') if ctrl => panel.cursor = panel.cursor.saturating_sub(1),
        KeyCode::Down => panel.cursor = panel.cursor.saturating_add(1),
        KeyCode::Char('n') if ctrl => panel.cursor = panel.cursor.saturating_add(1),
        KeyCode::Char('u') if ctrl => {
            set_panel_filter(state, panel.field, String::new());
            panel.cursor = 0;
        }
        KeyCode::Backspace => {
            let mut text = state.filter(panel.field).to_owned();
            text.pop();
            set_panel_filter(state, panel.field, text);
            panel.cursor = 0;
        }
        KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            let mut text = state.filter(panel.field).to_owned();
            text.push(ch);
            set_panel_filter(state, panel.field, text);
            panel.cursor = 0;
        }
        _ => {}
    }

    let option_count = state.field_options(panel.field).len();
    panel.cursor = panel.cursor.min(option_count.saturating_sub(1));
    view_data.panel = Some(panel);
}

fn set_panel_filter(state: &mut AppState, field: usize, text: String) {
    state.dispatch(AppCommand::SetFilter { field, text });
}

fn clear_from_cursor(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(label) = state.schema.get(view_data.cursor).map(|field| field.key.clone()) else {
        return;
    };
    state.dispatch(AppCommand::ClearFrom(view_data.cursor));
    tracing::debug!(from = %label, "selections cleared");
    emit_status(
        state,
        view_data,
        internal_tx,
        format!("cleared {label} and later fields"),
    );
}

fn copy_code<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if state.code().is_empty() {
        emit_status(state, view_data, internal_tx, "no code to copy");
        return;
    }
    let code = state.code().code.clone();
    let message = match runtime.copy_code(&code) {
        Ok(()) => {
            tracing::debug!(%code, "code copied");
            format!("copied {code}")
        }
        Err(error) => {
            tracing::warn!(%error, "copy failed");
            format!("copy failed: {error}")
        }
    };
    emit_status(state, view_data, internal_tx, message);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().fg(Color::White))
        .block(Block::default().title("valvecode").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_fields(frame, layout[1], state, view_data);

    let code_style = if state.code().valid {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let code = Paragraph::new(render_code_text(state))
        .style(code_style)
        .block(Block::default().title("part number").borders(Borders::ALL));
    frame.render_widget(code, layout[2]);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if let Some(panel) = view_data.panel {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let title = state
            .schema
            .get(panel.field)
            .map(|field| field.key.clone())
            .unwrap_or_default();
        let overlay = Paragraph::new(render_panel_text(state, panel)).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_fields(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let label_width = state
        .schema
        .fields()
        .iter()
        .map(|field| field.key.chars().count())
        .max()
        .unwrap_or(8) as u16;

    let header = WidgetRow::new(vec![
        Cell::from("field"),
        Cell::from("selection"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows = state
        .schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (value, placeholder) = field_value_label(state, index);
            let mut value_style = if placeholder {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let mut label_style = Style::default();
            if index == view_data.cursor {
                label_style = Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD);
                value_style = value_style.bg(Color::DarkGray);
            }
            WidgetRow::new(vec![
                Cell::from(field.key.clone()).style(label_style),
                Cell::from(value).style(value_style),
            ])
        });

    let table = WidgetTable::new(rows, [Constraint::Length(label_width), Constraint::Min(8)])
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .title(fields_title(state))
                .borders(Borders::ALL),
        );

    match load_error_text(state) {
        Some(message) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1)])
                .split(area);
            let error = Paragraph::new(message)
                .style(Style::default().fg(Color::Red))
                .block(Block::default().title("error").borders(Borders::ALL));
            frame.render_widget(error, split[0]);
            frame.render_widget(table, split[1]);
        }
        None => frame.render_widget(table, area),
    }
}

fn header_text(state: &AppState) -> String {
    format!(
        "Valve: {} | {}",
        state.category,
        state.progress().label()
    )
}

fn fields_title(state: &AppState) -> String {
    match &state.load {
        LoadStatus::Loading => "fields (loading…)".to_owned(),
        LoadStatus::Ready { rows } => format!("fields ({rows} rows)"),
        LoadStatus::Failed(_) => "fields (no data)".to_owned(),
    }
}

fn load_error_text(state: &AppState) -> Option<&str> {
    match &state.load {
        LoadStatus::Failed(message) => Some(message),
        _ => None,
    }
}

/// Selected value for the field, or its placeholder. The flag is true for the
/// placeholder.
fn field_value_label(state: &AppState, field: usize) -> (String, bool) {
    match state.selected_value(field) {
        Some(value) => (value.to_owned(), false),
        None => (
            state
                .schema
                .get(field)
                .map(|descriptor| descriptor.placeholder())
                .unwrap_or_default(),
            true,
        ),
    }
}

fn render_code_text(state: &AppState) -> String {
    let code = state.code();
    let shown = if code.is_empty() { NO_CODE } else { &code.code };
    format!("{shown}\n{}", code.status_label())
}

fn render_panel_text(state: &AppState, panel: PanelUiState) -> String {
    let mut lines = Vec::new();
    let key = state
        .schema
        .get(panel.field)
        .map(|field| field.key.as_str())
        .unwrap_or_default();
    let query = state.filter(panel.field);
    if query.is_empty() {
        lines.push(format!("search {key}…"));
    } else {
        lines.push(format!("search: {query}"));
    }
    lines.push(String::new());

    let options = state.field_options(panel.field);
    if options.is_empty() {
        lines.push("No results".to_owned());
    } else {
        let selected = state.selected_value(panel.field);
        let start = panel
            .cursor
            .saturating_sub(PANEL_WINDOW / 2)
            .min(options.len().saturating_sub(PANEL_WINDOW));
        let end = (start + PANEL_WINDOW).min(options.len());
        for (index, value) in options.iter().enumerate().take(end).skip(start) {
            let prefix = if index == panel.cursor { "> " } else { "  " };
            let mark = if Some(value.as_str()) == selected {
                " ✓"
            } else {
                ""
            };
            lines.push(format!("{prefix}{value}{mark}"));
        }
        if options.len() > PANEL_WINDOW {
            lines.push(format!("{}/{}", panel.cursor + 1, options.len()));
        }
    }

    lines.push(String::new());
    lines.push("type filter | up/down pick | enter select | esc close".to_owned());
    lines.join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }
    let default = if view_data.panel.is_some() {
        "type filter | ctrl+u clear | enter select | esc close"
    } else {
        "j/k move | enter choose | x clear | R reset | y copy | ? help | q quit"
    };
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
    }
}

fn help_overlay_text() -> &'static str {
    "fields: j/k or up/down move | g/G first/last | enter or space open options\n\
fields: x clear this and later fields | R reset all | y copy code\n\
options: type to filter | backspace | ctrl+u clear filter | up/down or ctrl+p/ctrl+n\n\
options: enter select | esc close\n\
global: ? help | q quit | ctrl+q or ctrl+c quit anywhere\n\
press any key to close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
