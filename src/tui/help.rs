use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, log_path: Option<&std::path::Path>) {
    let mut lines = vec![
        Line::from("Keybinds:"),
        key_line("Esc", 9, "Quit"),
        key_line("Ctrl-C", 6, "Quit"),
        key_line("Enter", 7, "Register (with item name) / look up"),
        key_line("Tab", 9, "Switch input field"),
        key_line("Ctrl-R", 6, "Refresh last tracking number"),
        key_line("Ctrl-Y", 6, "Copy shown tracking number"),
        key_line("↑/↓", 9, "Scroll history"),
        key_line("F1", 10, "Toggle this help"),
        Line::from(""),
        Line::from("Stages:"),
        Line::from("  登録 → 発送地 → 経由地 → 配達地域 → 配達完了"),
    ];
    if let Some(path) = log_path {
        lines.push(Line::from(""));
        lines.push(Line::from("Log file:"));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(path.display().to_string(), Style::default().fg(Color::Cyan)),
        ]));
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
