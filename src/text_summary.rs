//! Text summary builder for CLI output.

use crate::map::{MapSync, ViewportBackend};
use crate::presenter::DisplayModel;
use crate::stage::StepState;

/// Width of the ASCII progress bar, in characters.
const BAR_WIDTH: usize = 50;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(
    model: &DisplayModel,
    map: &MapSync<ViewportBackend>,
) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Tracking number: {}", model.tracking_number));
    if !model.item_name.trim().is_empty() {
        lines.push(format!("Item: {}", model.item_name));
    }
    lines.push(format!("Status: {}", model.status));
    lines.push(format!("Shipped: {}", model.date_label));
    lines.push(String::new());
    lines.push(progress_bar_line(
        model.fill_width_percent,
        model.progress.completion_percent,
        BAR_WIDTH,
    ));
    lines.push(
        model
            .steps
            .iter()
            .map(|s| {
                let mark = match s.state {
                    StepState::Completed => "✔",
                    StepState::Active => "●",
                    StepState::Pending => "○",
                };
                format!("{mark} {}", s.name)
            })
            .collect::<Vec<_>>()
            .join("  "),
    );
    lines.push(String::new());

    if model.history.is_empty() {
        lines.push("History: (none)".into());
    } else {
        lines.push("History:".into());
        lines.extend(model.history.iter().map(|h| format!("  {h}")));
    }

    match (map.map(), map.marker()) {
        (Some(m), Some(marker)) => lines.push(format!(
            "Location: {:.4}, {:.4} (zoom {})",
            marker.position.lat, marker.position.lng, m.view.zoom
        )),
        _ => lines.push("Location: unavailable".into()),
    }

    TextSummary { lines }
}

/// `[=====-----] 50%`. The bar follows `fill_width_percent`, the label shows
/// `completion_percent`.
fn progress_bar_line(fill_width_percent: f64, completion_percent: f64, width: usize) -> String {
    let filled = ((fill_width_percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:.0}%",
        "=".repeat(filled),
        "-".repeat(width - filled),
        completion_percent
    )
}
