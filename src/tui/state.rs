use crate::map::{MapSync, ViewportBackend};
use crate::model::TrackEvent;
use crate::orchestrator::UiCommand;
use crate::presenter::{DisplayModel, TrackingPresenter};
use ratatui::style::Color;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TrackingNumber,
    ItemName,
}

pub struct UiState {
    pub focus: Field,
    pub tracking_input: String,
    pub item_input: String,
    pub info: String,
    /// Last request failure; replaces the details pane until the next snapshot.
    pub error: Option<String>,
    pub model: Option<DisplayModel>,
    pub presenter: TrackingPresenter<ViewportBackend>,
    pub show_help: bool,
    pub history_scroll: usize,
}

impl UiState {
    pub fn new(presenter: TrackingPresenter<ViewportBackend>) -> Self {
        Self {
            focus: Field::TrackingNumber,
            tracking_input: String::new(),
            item_input: String::new(),
            info: "Enter a tracking number and press Enter".into(),
            error: None,
            model: None,
            presenter,
            show_help: false,
            history_scroll: 0,
        }
    }

    pub fn map(&self) -> &MapSync<ViewportBackend> {
        self.presenter.map()
    }

    pub fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Field::TrackingNumber => &mut self.tracking_input,
            Field::ItemName => &mut self.item_input,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::TrackingNumber => Field::ItemName,
            Field::ItemName => Field::TrackingNumber,
        };
    }

    /// Build the command for the form contents, or explain why there is none.
    pub fn submit(&mut self) -> Option<UiCommand> {
        let tracking_number = self.tracking_input.trim();
        if tracking_number.is_empty() {
            self.info = "Tracking number is required".into();
            self.focus = Field::TrackingNumber;
            return None;
        }
        let item_name = Some(self.item_input.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Some(UiCommand::Submit {
            tracking_number: tracking_number.to_string(),
            item_name,
        })
    }

    pub fn apply_event(&mut self, ev: TrackEvent, now: OffsetDateTime) {
        match ev {
            TrackEvent::Registered { tracking_number } => {
                self.info = format!("Registered {tracking_number}");
                self.tracking_input.clear();
                self.item_input.clear();
                self.focus = Field::TrackingNumber;
            }
            TrackEvent::Snapshot(snapshot) => {
                let model = self.presenter.render(&snapshot, now);
                self.info = format!("Updated {}", model.tracking_number);
                self.error = None;
                self.history_scroll = 0;
                self.model = Some(model);
            }
            TrackEvent::RequestFailed(message) => {
                self.info = "Request failed".into();
                self.error = Some(message);
                self.model = None;
            }
            TrackEvent::Info(info) => {
                self.info = info.to_message();
            }
        }
    }

    pub fn scroll_history(&mut self, delta: isize) {
        let len = self.model.as_ref().map_or(0, |m| m.history.len());
        let next = self.history_scroll.saturating_add_signed(delta);
        self.history_scroll = next.min(len.saturating_sub(1));
    }
}

/// Text colour for a backend `status_class`.
pub fn status_color(status_class: Option<&str>) -> Color {
    match status_class {
        Some("status-unshipped") => Color::Gray,
        Some("status-shipped") => Color::Cyan,
        Some("status-intransit") => Color::Blue,
        Some("status-outfordelivery") => Color::Yellow,
        Some("status-delivered") => Color::Green,
        Some("status-unknown") => Color::Red,
        _ => Color::White,
    }
}
