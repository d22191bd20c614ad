//! Schemaquest - schema-aware terminal API client
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution

mod app;
mod catalog;
mod constants;
mod curl;
mod form;
mod messages;
mod models;
mod network;
mod schema;
mod storage;
mod tree;
mod ui;
mod vars;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;

use app::AppActor;
use form::FormMode;
use messages::ui_events::{key_to_ui_event, LookupStep, Mode, Panel};
use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use network::NetworkActor;
use ui::{highlight_json, method_color, status_color};

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
    // Initialize logging to file (the terminal owns stdout)
    let file_appender = tracing_appender::rolling::never(".", "schemaquest.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    // The API description comes in as the first CLI argument
    let catalog = match std::env::args().nth(1) {
        Some(path) => match catalog::parse_openapi(&PathBuf::from(&path)) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(error = %e, path, "Could not load API description");
                None
            }
        },
        None => None,
    };

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(catalog, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                let form_mode = current_state.form.as_ref().map(|f| f.mode);
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.mode,
                    current_state.active_panel,
                    form_mode,
                    current_state.tree.searching,
                ) {
                    if matches!(event, UiEvent::Quit) {
                        let _ = ui_tx.send(event);
                        break;
                    }
                    let _ = ui_tx.send(event);
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

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(main_chunks[0]);

    draw_endpoints(f, state, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[1]);

    draw_form(f, state, right[0]);
    draw_response(f, state, right[1]);
    draw_status_bar(f, state, main_chunks[1]);

    // Overlays: at most one is active
    match state.mode {
        Mode::TreeView | Mode::SaveLookup | Mode::CaptureName => {
            draw_tree_popup(f, state, area);
            if state.prompt.is_some() {
                draw_prompt_popup(f, state, area);
            }
        }
        Mode::VariablePicker | Mode::LookupWizard(_) => draw_picker_popup(f, state, area),
        Mode::Import => draw_prompt_popup(f, state, area),
        Mode::Help => draw_help_popup(f, area),
        Mode::Main => {}
    }
}

fn draw_endpoints(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Endpoints && state.mode == Mode::Main;
    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    if state.endpoints.is_empty() {
        let content = "No API description loaded.\n\nStart with:\n  schemaquest openapi.yaml";
        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(" Endpoints "),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
        return;
    }

    let title = format!(
        " {} ({}) ",
        state.catalog_title.as_deref().unwrap_or("Endpoints"),
        state.endpoints.len()
    );

    let items: Vec<ListItem> = state
        .endpoints
        .iter()
        .map(|ep| {
            let mcolor = method_color(ep.method.as_str());
            let method_span = Span::styled(
                format!("{:<7}", ep.method.as_str()),
                Style::default().fg(mcolor).bold(),
            );
            let mut path_style = Style::default();
            if ep.deprecated {
                path_style = path_style.add_modifier(Modifier::CROSSED_OUT);
            }
            ListItem::new(Line::from(vec![
                method_span,
                Span::styled(ep.path.clone(), path_style),
            ]))
        })
        .collect();

    let highlight_style = if is_focused {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().bold()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(highlight_style);

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected_endpoint));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_form(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Form && state.mode == Mode::Main;
    let editing = state
        .form
        .as_ref()
        .map(|form| form.mode == FormMode::Edit)
        .unwrap_or(false);

    let border_style = if is_focused && editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let Some(form) = &state.form else {
        let paragraph = Paragraph::new("Select an endpoint to build a request.")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(" Request "),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
        return;
    };

    let title = if editing {
        format!(" {} [edit: {}] ", form.endpoint_key, ui::editor_hint(form))
    } else {
        format!(" {} ", form.endpoint_key)
    };

    let items = ui::form_rows(form, &state.variables);
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(if editing {
            Style::default().bg(Color::Yellow).fg(Color::Black)
        } else {
            Style::default().bg(Color::DarkGray)
        });

    let mut list_state = ListState::default();
    list_state.select(Some(form.focus));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_response(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Response && state.mode == Mode::Main;
    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let status_text = match state.response.status_code {
        Some(code) => {
            let color = status_color(code);
            Span::styled(format!(" {} ", code), Style::default().fg(color).bold())
        }
        None => Span::raw(" Response "),
    };

    let time_text = if state.response.time_ms > 0 {
        format!(" {}ms ", state.response.time_ms)
    } else {
        String::new()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(status_text)
        .title_bottom(Line::from(time_text).right_aligned());

    let lines = highlight_json(&state.response.body);
    let response = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.response_scroll, 0));
    f.render_widget(response, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let text = if !state.status.is_empty() {
        format!(" {} ", state.status)
    } else if state.is_loading {
        " Loading... ".to_string()
    } else {
        match state.mode {
            Mode::TreeView => {
                " ↑↓:move | Enter:toggle | ←:out | /:search | n/N:match | c:capture | L:lookup | q:back "
                    .to_string()
            }
            Mode::Main => {
                " Tab:panel | Enter:select/edit | s:send | c:curl | t:tree | v:var | l:lookup | ?:help | q:quit "
                    .to_string()
            }
            _ => " Enter:confirm | Esc:cancel ".to_string(),
        }
    };

    let history = state
        .history_index
        .map(|i| format!("[history {}] ", i + 1))
        .unwrap_or_default();

    let bar = Paragraph::new(format!("{}{}", history, text))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_tree_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(90, 90, area);

    let Some(value) = &state.tree_value else {
        return;
    };
    let nodes = tree::build_visible(value, &state.tree.collapsed);

    let mut tree_state = state.tree.clone();
    tree_state.clamp(nodes.len());
    let viewport = popup_area.height.saturating_sub(3) as usize;
    tree_state.follow_cursor(viewport);

    let lines: Vec<Line> = nodes
        .iter()
        .enumerate()
        .skip(tree_state.scroll)
        .take(viewport)
        .map(|(i, node)| {
            let is_match = tree_state.matches.contains(&i);
            let mut line = ui::tree_row(node, is_match);
            if i == tree_state.cursor {
                line = line.style(Style::default().bg(Color::DarkGray));
            }
            line
        })
        .collect();

    let footer = if tree_state.searching {
        format!(" /{}  ({} matches) ", tree_state.query, tree_state.matches.len())
    } else if !tree_state.query.is_empty() {
        format!(
            " {}  [{} of {} matches] ",
            tree_state
                .selected(&nodes)
                .map(|n| n.path.clone())
                .unwrap_or_default(),
            if tree_state.matches.is_empty() {
                0
            } else {
                tree_state.match_pos + 1
            },
            tree_state.matches.len()
        )
    } else {
        format!(
            " {} ",
            tree_state
                .selected(&nodes)
                .map(|n| n.path.clone())
                .unwrap_or_default()
        )
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Response tree ")
        .title_bottom(Line::from(footer).left_aligned())
        .style(Style::default().bg(Color::Black));

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn draw_picker_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(60, 50, area);

    if state.mode == Mode::LookupWizard(LookupStep::Fetching) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Lookup ")
            .style(Style::default().bg(Color::Black));
        let paragraph = Paragraph::new("Fetching...").block(block);
        f.render_widget(Clear, popup_area);
        f.render_widget(paragraph, popup_area);
        return;
    }

    let Some(picker) = &state.picker else {
        return;
    };

    let items: Vec<ListItem> = picker
        .items
        .iter()
        .map(|(_, label)| ListItem::new(label.clone()))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(picker.title.clone())
                .style(Style::default().bg(Color::Black)),
        )
        .highlight_style(Style::default().fg(Color::Yellow).bold());

    let mut list_state = ListState::default();
    list_state.select(Some(picker.selected));

    f.render_widget(Clear, popup_area);
    f.render_stateful_widget(list, popup_area, &mut list_state);
}

fn draw_prompt_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(70, 25, area);

    let Some(prompt) = &state.prompt else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(prompt.title.clone())
        .style(Style::default().bg(Color::Black));

    let content = if prompt.buffer.is_empty() {
        "..."
    } else {
        &prompt.buffer
    };

    let input = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);

    let help_text = r#"
 SCHEMAQUEST - Keyboard Shortcuts

 NAVIGATION
   Tab / Shift+Tab    Switch panels
   ↑/↓ or j/k         Move selection / focus
   [ / ]              Walk request history

 FORM
   Enter / e          Edit field, toggle group, submit
   s                  Send request
   c                  Copy as cURL
   i                  Import a JSON body
   v                  Insert a {{variable}}
   l                  Run a saved lookup
   x                  Clear field
   p                  Remember value for this field name

 EDITING
   Esc                Stop editing (keeps applied edits)
   ↑/↓                Cycle boolean/enum, step date segment
   ←/→                Move date segment cursor
   Ctrl+N             Set date field to now

 RESPONSE TREE (t)
   Enter              Expand / collapse node
   ←                  Collapse or step out
   /                  Search, n/N to cycle matches
   c                  Capture node value as variable
   L                  Save node path as lookup

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
