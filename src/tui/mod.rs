mod clipboard;
mod help;
mod map_view;
mod progress;
mod state;

use crate::cli::{build_config, build_presenter, Cli};
use crate::client::TrackingClient;
use crate::model::TrackEvent;
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Terminal,
};
use state::{status_color, Field, UiState};
use std::path::PathBuf;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let log_path = crate::logging::init_file(&args.log_level).ok();
    let cfg = build_config(&args);
    let client = TrackingClient::new(&cfg)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TrackEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    if let Some(tracking_number) = args.tracking_number.clone() {
        let _ = cmd_tx.send(UiCommand::Submit {
            tracking_number,
            item_name: args.registration(),
        });
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, log_path, event_rx, cmd_tx));

    let res = orchestrator::run_controller(client, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

fn run_threaded(
    args: Cli,
    log_path: Option<PathBuf>,
    event_rx: UnboundedReceiver<TrackEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let res = with_restore(
        || {
            execute!(io::stdout(), EnterAlternateScreen).context("enter alternate screen")?;
            let terminal =
                Terminal::new(CrosstermBackend::new(io::stdout())).context("create terminal")?;
            event_loop(terminal, args, log_path, event_rx, &cmd_tx)
        },
        || {
            disable_raw_mode().ok();
            execute!(io::stdout(), LeaveAlternateScreen).ok();
        },
    );
    if res.is_err() {
        let _ = cmd_tx.send(UiCommand::Quit);
    }
    res
}

/// Run `body`, then `restore`, whether `body` succeeded or not.
fn with_restore<T>(body: impl FnOnce() -> Result<T>, restore: impl FnOnce()) -> Result<T> {
    let res = body();
    restore();
    res
}

fn event_loop(
    mut terminal: Terminal<CrosstermBackend<io::Stdout>>,
    args: Cli,
    log_path: Option<PathBuf>,
    mut event_rx: UnboundedReceiver<TrackEvent>,
    cmd_tx: &UnboundedSender<UiCommand>,
) -> Result<()> {
    terminal.clear().ok();

    // The presenter (and so the map) lives on the UI thread only.
    let mut state = UiState::new(build_presenter(&build_config(&args)));
    if let Some(t) = args.tracking_number.as_deref() {
        state.tracking_input = t.to_string();
    }
    if let Some(n) = args.item_name.as_deref() {
        state.item_input = n.to_string();
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev, time::OffsetDateTime::now_utc());
        }

        if last_tick.elapsed() >= tick_rate {
            terminal
                .draw(|f| draw(f.area(), f, &state, log_path.as_deref()))
                .ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let Ok(Event::Key(k)) = event::read() else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }
        match (k.modifiers, k.code) {
            (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                let _ = cmd_tx.send(UiCommand::Quit);
                return Ok(());
            }
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                let _ = cmd_tx.send(UiCommand::Refresh);
            }
            (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
                state.info = match state.model.as_ref() {
                    Some(m) => match clipboard::copy_to_clipboard(&m.tracking_number) {
                        Ok(()) => format!("✓ Copied to clipboard: {}", m.tracking_number),
                        Err(e) => format!("Clipboard copy failed: {e:#}"),
                    },
                    None => "Nothing to copy yet".into(),
                };
            }
            (_, KeyCode::F(1)) => {
                state.show_help = !state.show_help;
            }
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => state.toggle_focus(),
            (_, KeyCode::Enter) => {
                if let Some(cmd) = state.submit() {
                    let _ = cmd_tx.send(cmd);
                }
            }
            (_, KeyCode::Up) => state.scroll_history(-1),
            (_, KeyCode::Down) => state.scroll_history(1),
            (_, KeyCode::Backspace) => {
                state.focused_input().pop();
            }
            (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                state.focused_input().push(c);
            }
            _ => {}
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, log_path: Option<&std::path::Path>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(area);

    draw_form(rows[0], f, state);
    if state.show_help {
        help::draw_help(rows[1], f, log_path);
    } else {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        draw_details(cols[0], f, state);
        map_view::draw_map(cols[1], f, state.map());
    }
    draw_status_line(rows[2], f, state);
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let field = |label: &'static str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if focused { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<16}"), style),
            Span::raw(value.to_string()),
            Span::styled(cursor, Style::default().fg(Color::Yellow)),
        ])
    };
    let p = Paragraph::new(vec![
        field(
            "Tracking number:",
            &state.tracking_input,
            state.focus == Field::TrackingNumber,
        ),
        field(
            "Item name:",
            &state.item_input,
            state.focus == Field::ItemName,
        ),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Cainiao tracking (Enter: submit, F1: help)"),
    );
    f.render_widget(p, area);
}

fn draw_details(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    if let Some(err) = state.error.as_deref() {
        let p = Paragraph::new(Line::from(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(Color::Red),
        )))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Details"));
        f.render_widget(p, area);
        return;
    }
    let Some(model) = state.model.as_ref() else {
        let p = Paragraph::new("No tracking information yet.")
            .block(Block::default().borders(Borders::ALL).title("Details"));
        f.render_widget(p, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(4),
            Constraint::Min(3),
        ])
        .split(area);

    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Gray));
    let info = Paragraph::new(vec![
        Line::from(vec![label("Tracking number: "), Span::raw(model.tracking_number.clone())]),
        Line::from(vec![label("Item:            "), Span::raw(model.item_name.clone())]),
        Line::from(vec![
            label("Status:          "),
            Span::styled(
                model.status.clone(),
                Style::default()
                    .fg(status_color(model.status_class.as_deref()))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![label("Shipped:         "), Span::raw(model.date_label.clone())]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Details"));
    f.render_widget(info, rows[0]);

    f.render_widget(progress::ProgressBar::new(model), rows[1]);

    let items: Vec<ListItem> = model
        .history
        .iter()
        .skip(state.history_scroll)
        .map(|h| ListItem::new(h.as_str()))
        .collect();
    let title = format!("History ({})", model.history.len());
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, rows[2]);
}

fn draw_status_line(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let style = if state.error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    f.render_widget(Paragraph::new(Span::styled(state.info.clone(), style)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn terminal_is_restored_when_setup_fails() {
        let restored = Cell::new(false);
        let res: Result<()> = with_restore(
            || Err(anyhow::anyhow!("create terminal")),
            || restored.set(true),
        );
        assert!(res.is_err());
        assert!(restored.get());
    }

    #[test]
    fn terminal_is_restored_after_a_clean_exit() {
        let restored = Cell::new(false);
        let res = with_restore(|| Ok(3), || restored.set(true));
        assert_eq!(res.unwrap(), 3);
        assert!(restored.get());
    }
}
