//! Stage progress bar.
//!
//! Dots sit at fixed fractions of the bar between the start and end margins; the
//! filled line runs from the left edge to `fill_width_percent`.

use crate::presenter::DisplayModel;
use crate::stage::{BarMargins, StepState};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

/// Column (relative to the bar start) of each of `count` dots.
pub fn dot_columns(width: u16, count: usize, margins: BarMargins) -> Vec<u16> {
    if count == 0 || width == 0 {
        return Vec::new();
    }
    let span = 100.0 - margins.start - margins.end;
    (0..count)
        .map(|i| {
            let frac = if count == 1 {
                0.0
            } else {
                i as f64 / (count - 1) as f64
            };
            percent_to_column(margins.start + frac * span, width)
        })
        .collect()
}

/// Number of filled columns for a fill width given in percent.
pub fn fill_columns(fill_width_percent: f64, width: u16) -> u16 {
    let cols = (fill_width_percent.clamp(0.0, 100.0) / 100.0 * f64::from(width)).round() as u16;
    cols.min(width)
}

fn percent_to_column(percent: f64, width: u16) -> u16 {
    let max = width.saturating_sub(1);
    ((percent / 100.0 * f64::from(width)).round() as u16).min(max)
}

pub struct ProgressBar<'a> {
    model: &'a DisplayModel,
    margins: BarMargins,
}

impl<'a> ProgressBar<'a> {
    pub fn new(model: &'a DisplayModel) -> Self {
        Self {
            model,
            margins: BarMargins::default(),
        }
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Progress");
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 || inner.width < 5 {
            return;
        }

        let line_y = inner.y;
        let label_y = inner.y + 1;
        let filled = fill_columns(self.model.fill_width_percent, inner.width);
        let dots = dot_columns(inner.width, self.model.steps.len(), self.margins);

        let first = dots.first().copied().unwrap_or(0);
        let last = dots.last().copied().unwrap_or(0);
        for col in first..=last {
            let style = if col < filled {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            buf.set_string(inner.x + col, line_y, "─", style);
        }

        for (step, col) in self.model.steps.iter().zip(dots.iter().copied()) {
            let (glyph, style) = match step.state {
                StepState::Completed => ("●", Style::default().fg(Color::Green)),
                StepState::Active => (
                    "◉",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                StepState::Pending => ("○", Style::default().fg(Color::DarkGray)),
            };
            buf.set_string(inner.x + col, line_y, glyph, style);

            // Center the label under its dot, kept inside the bar.
            let name_width = step.name.chars().count() as u16 * 2;
            let start = col
                .saturating_sub(name_width / 2)
                .min(inner.width.saturating_sub(name_width));
            buf.set_stringn(
                inner.x + start,
                label_y,
                step.name,
                usize::from(inner.width - start),
                style,
            );
        }
    }
}
