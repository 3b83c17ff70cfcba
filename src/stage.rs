//! Shipment stage pipeline.
//!
//! Maps the status label sent by the backend onto a fixed five-step pipeline and
//! derives the completion percentage and progress-bar geometry from it.

use serde::Serialize;

/// Status label the backend uses when it cannot classify a shipment.
pub const UNKNOWN_STATUS: &str = "不明";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    NotShipped,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::NotShipped,
        Stage::Shipped,
        Stage::InTransit,
        Stage::OutForDelivery,
        Stage::Delivered,
    ];

    /// Status label as sent by the backend. Matching is done on this.
    pub fn label(self) -> &'static str {
        match self {
            Stage::NotShipped => "未発送",
            Stage::Shipped => "発送中",
            Stage::InTransit => "輸送中",
            Stage::OutForDelivery => "配達中",
            Stage::Delivered => "配達済",
        }
    }

    /// Name shown under the progress-bar dot.
    pub fn display_name(self) -> &'static str {
        match self {
            Stage::NotShipped => "登録",
            Stage::Shipped => "発送地",
            Stage::InTransit => "経由地",
            Stage::OutForDelivery => "配達地域",
            Stage::Delivered => "配達完了",
        }
    }

    pub fn position(self) -> usize {
        match self {
            Stage::NotShipped => 0,
            Stage::Shipped => 1,
            Stage::InTransit => 2,
            Stage::OutForDelivery => 3,
            Stage::Delivered => 4,
        }
    }

    pub fn from_label(label: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageIndex {
    At(Stage),
    /// No stage is highlighted.
    Unknown,
}

/// How a single pipeline step should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressStep {
    pub stage: Stage,
    pub name: &'static str,
    pub state: StepState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageProgress {
    pub index: StageIndex,
    pub completion_percent: f64,
}

/// Resolve a raw status label.
///
/// Unrecognized labels are treated as the first stage; only [`UNKNOWN_STATUS`]
/// clears the highlight.
pub fn stage_of(status: &str) -> StageProgress {
    let index = match Stage::from_label(status) {
        Some(stage) => StageIndex::At(stage),
        None if status == UNKNOWN_STATUS => StageIndex::Unknown,
        None => StageIndex::At(Stage::NotShipped),
    };
    StageProgress {
        index,
        completion_percent: completion_percent(index),
    }
}

fn completion_percent(index: StageIndex) -> f64 {
    let stage = match index {
        StageIndex::Unknown => return 0.0,
        StageIndex::At(stage) => stage,
    };
    if stage == Stage::Delivered {
        return 100.0;
    }
    let segments = (Stage::ALL.len() - 1) as f64;
    (stage.position() as f64 / segments * 100.0).clamp(0.0, 100.0)
}

impl StageProgress {
    pub fn step_state(&self, stage: Stage) -> StepState {
        let current = match self.index {
            StageIndex::Unknown => return StepState::Pending,
            StageIndex::At(current) => current.position(),
        };
        match stage.position() {
            p if p < current => StepState::Completed,
            p if p == current => StepState::Active,
            _ => StepState::Pending,
        }
    }

    pub fn steps(&self) -> Vec<ProgressStep> {
        Stage::ALL
            .into_iter()
            .map(|stage| ProgressStep {
                stage,
                name: stage.display_name(),
                state: self.step_state(stage),
            })
            .collect()
    }

    pub fn fill_width(&self, margins: BarMargins) -> f64 {
        margins.fill_width(self.completion_percent)
    }
}

/// Space reserved on each side of the bar (percent of total width) so the first
/// and last dots sit at fixed positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarMargins {
    pub start: f64,
    pub end: f64,
}

impl Default for BarMargins {
    fn default() -> Self {
        Self {
            start: 10.0,
            end: 10.0,
        }
    }
}

impl BarMargins {
    /// Width of the filled line, in percent of the whole bar.
    pub fn fill_width(self, completion_percent: f64) -> f64 {
        if completion_percent <= 0.0 {
            return self.start;
        }
        if completion_percent >= 100.0 {
            return 100.0 - self.end;
        }
        let span = 100.0 - self.start - self.end;
        self.start + completion_percent / 100.0 * span
    }
}
