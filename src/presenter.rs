//! One render pass: snapshot in, display model out, map updated on the side.

use crate::history::HistoryFormatter;
use crate::map::{MapBackend, MapHandle, MapSync, MarkerUpdate};
use crate::model::TrackingSnapshot;
use crate::stage::{stage_of, BarMargins, ProgressStep, StageProgress};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    pub tracking_number: String,
    pub item_name: String,
    pub status: String,
    pub status_class: Option<String>,
    pub progress: StageProgress,
    pub steps: Vec<ProgressStep>,
    pub fill_width_percent: f64,
    /// RFC 3339, absent when the reference date could not be parsed.
    pub reference_date: Option<String>,
    pub elapsed_days: Option<i64>,
    pub date_label: String,
    pub history: Vec<String>,
    pub location: Option<serde_json::Value>,
    pub marker: MarkerUpdate,
}

pub struct TrackingPresenter<B: MapBackend> {
    formatter: HistoryFormatter,
    margins: BarMargins,
    map: MapSync<B>,
    handle: MapHandle,
}

impl<B: MapBackend> TrackingPresenter<B> {
    pub fn new(formatter: HistoryFormatter, mut map: MapSync<B>) -> Self {
        let handle = map.ensure_map();
        Self {
            formatter,
            margins: BarMargins::default(),
            map,
            handle,
        }
    }

    pub fn render(&mut self, snapshot: &TrackingSnapshot, now: OffsetDateTime) -> DisplayModel {
        let progress = stage_of(&snapshot.status);
        let formatted = self
            .formatter
            .format(&snapshot.history, &snapshot.last_updated);
        let date = formatted.reference.date;
        let marker = self
            .map
            .update_position(&self.handle, snapshot.current_location.as_ref());

        tracing::debug!(
            tracking_number = %snapshot.tracking_number,
            status = %snapshot.status,
            completion = progress.completion_percent,
            ?marker,
            "render pass"
        );

        DisplayModel {
            tracking_number: snapshot.tracking_number.clone(),
            item_name: snapshot.item_name.clone(),
            status: snapshot.status.clone(),
            status_class: snapshot.status_class.clone(),
            progress,
            steps: progress.steps(),
            fill_width_percent: progress.fill_width(self.margins),
            reference_date: date.and_then(|d| d.format(&Rfc3339).ok()),
            elapsed_days: date.map(|d| crate::history::elapsed_days(d, now)),
            date_label: self.formatter.date_label(&formatted.reference, now),
            history: formatted.entries,
            location: snapshot.current_location.clone(),
            marker,
        }
    }

    pub fn map(&self) -> &MapSync<B> {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::tests::RecordingBackend;
    use crate::map::{MapConfig, ViewportBackend};
    use crate::model::{HistoryEvent, Position};
    use crate::stage::{Stage, StageIndex, StepState};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use time::macros::datetime;

    fn snapshot(status: &str, location: Option<serde_json::Value>) -> TrackingSnapshot {
        TrackingSnapshot {
            tracking_number: "LP00123456789".into(),
            item_name: "Mechanical keyboard".into(),
            status: status.into(),
            status_class: Some("status-delivered".into()),
            last_updated: "2024-01-05 08:00".into(),
            history: vec![
                HistoryEvent {
                    timestamp: "2024-01-01 10:00".into(),
                    location: "Hangzhou".into(),
                    description: "Accepted".into(),
                },
                HistoryEvent {
                    timestamp: "2024-01-03 18:20".into(),
                    location: "Narita".into(),
                    description: "Customs cleared".into(),
                },
                HistoryEvent {
                    timestamp: "2024-01-05 08:00".into(),
                    location: "Tokyo".into(),
                    description: "Delivered".into(),
                },
            ],
            current_location: location,
        }
    }

    fn presenter() -> TrackingPresenter<ViewportBackend> {
        TrackingPresenter::new(
            HistoryFormatter::default(),
            MapSync::new(ViewportBackend::default(), MapConfig::default()),
        )
    }

    #[test]
    fn delivered_snapshot_renders_end_to_end() {
        let mut p = presenter();
        let snap = snapshot("配達済", Some(json!({"lat": 35.68, "lng": 139.76})));
        let model = p.render(&snap, datetime!(2024-01-11 10:00 UTC));

        assert_eq!(model.progress.completion_percent, 100.0);
        assert_eq!(model.fill_width_percent, 90.0);
        assert_eq!(
            model.marker,
            MarkerUpdate::Created {
                at: Position::new(35.68, 139.76)
            }
        );
        assert_eq!(
            p.map().marker().unwrap().position,
            Position::new(35.68, 139.76)
        );
        assert_eq!(
            model.history,
            vec![
                "2024-01-01 10:00 - Hangzhou: Accepted".to_string(),
                "2024-01-03 18:20 - Narita: Customs cleared".to_string(),
                "2024-01-05 08:00 - Tokyo: Delivered".to_string(),
            ]
        );
        assert_eq!(model.date_label, "2024/01/01 (10日経過)");
        assert_eq!(model.elapsed_days, Some(10));
        assert_eq!(
            model.reference_date.as_deref(),
            Some("2024-01-01T10:00:00Z")
        );
        assert!(model
            .steps
            .iter()
            .take(4)
            .all(|s| s.state == StepState::Completed));
    }

    #[test]
    fn repeated_renders_reuse_map_and_marker() {
        let mut p = TrackingPresenter::new(
            HistoryFormatter::default(),
            MapSync::new(RecordingBackend::default(), MapConfig::default()),
        );
        let now = datetime!(2024-01-11 10:00 UTC);
        p.render(&snapshot("輸送中", Some(json!({"lat": 30.0, "lng": 120.0}))), now);
        let second = p.render(&snapshot("配達中", Some(json!({"lat": 34.0, "lng": 135.0}))), now);

        assert_eq!(
            second.marker,
            MarkerUpdate::Moved {
                at: Position::new(34.0, 135.0)
            }
        );
        assert_eq!(p.map().backend().maps_created, 1);
        assert_eq!(p.map().backend().markers_created, 1);
    }

    #[test]
    fn unknown_status_and_missing_location_degrade_quietly() {
        let mut p = presenter();
        let mut snap = snapshot("不明", None);
        snap.history.clear();
        snap.last_updated = "not a date".into();
        let model = p.render(&snap, datetime!(2024-01-11 10:00 UTC));

        assert_eq!(model.progress.index, StageIndex::Unknown);
        assert_eq!(model.fill_width_percent, 10.0);
        assert!(model.steps.iter().all(|s| s.state == StepState::Pending));
        assert_eq!(model.marker, MarkerUpdate::Unchanged);
        assert_eq!(model.date_label, "not a date");
        assert_eq!(model.elapsed_days, None);
        assert_eq!(model.reference_date, None);
        assert!(model.history.is_empty());
    }

    #[test]
    fn unrecognized_status_behaves_like_first_stage() {
        let mut p = presenter();
        let model = p.render(&snapshot("情報受信", None), datetime!(2024-01-11 10:00 UTC));
        assert_eq!(model.progress.index, StageIndex::At(Stage::NotShipped));
        assert_eq!(model.steps[0].state, StepState::Active);
        assert_eq!(model.fill_width_percent, 10.0);
    }

    #[test]
    fn losing_the_location_clears_the_marker() {
        let mut p = presenter();
        let now = datetime!(2024-01-11 10:00 UTC);
        p.render(&snapshot("輸送中", Some(json!({"lat": 30.0, "lng": 120.0}))), now);
        let model = p.render(&snapshot("輸送中", None), now);
        assert_eq!(model.marker, MarkerUpdate::Cleared);
        assert!(p.map().marker().is_none());
        assert_eq!(p.map().backend().maps_created(), 1);
    }
}
