//! History formatting and shipping-date derivation.

use crate::model::HistoryEvent;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const MS_PER_DAY: i128 = 1000 * 60 * 60 * 24;

/// Date the shipment is considered to have started.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDate {
    pub raw: String,
    /// `None` when `raw` could not be parsed; render `raw` instead.
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormattedHistory {
    pub reference: ReferenceDate,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryFormatter {
    /// Offset applied to timestamps that carry none, and used for display.
    offset: UtcOffset,
}

impl Default for HistoryFormatter {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl HistoryFormatter {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Formatter using the machine's local offset, UTC if it cannot be determined.
    pub fn local() -> Self {
        Self::new(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
    }

    /// `history` must already be in chronological order; it is not re-sorted.
    pub fn format(&self, history: &[HistoryEvent], last_updated: &str) -> FormattedHistory {
        let raw = history
            .first()
            .map(|e| e.timestamp.as_str())
            .unwrap_or(last_updated);
        let date = self.parse_timestamp(raw);
        if date.is_none() {
            tracing::warn!(timestamp = raw, "unparseable reference date");
        }
        let entries = history
            .iter()
            .map(|e| format!("{} - {}: {}", e.timestamp, e.location, e.description))
            .collect();
        FormattedHistory {
            reference: ReferenceDate {
                raw: raw.to_string(),
                date,
            },
            entries,
        }
    }

    pub fn parse_timestamp(&self, raw: &str) -> Option<OffsetDateTime> {
        let raw = raw.trim();
        if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
            return Some(dt);
        }

        let normalized = normalize_separators(raw);
        let with_seconds = format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");
        let with_minutes = format_description!("[year]/[month]/[day] [hour]:[minute]");
        let date_only = format_description!("[year]/[month]/[day]");

        PrimitiveDateTime::parse(&normalized, with_seconds)
            .or_else(|_| PrimitiveDateTime::parse(&normalized, with_minutes))
            .or_else(|_| Date::parse(&normalized, date_only).map(|d| d.midnight()))
            .ok()
            .map(|p| p.assume_offset(self.offset))
    }

    /// `YYYY/MM/DD (N日経過)`, or the raw string when the date is unusable.
    pub fn date_label(&self, reference: &ReferenceDate, now: OffsetDateTime) -> String {
        let Some(date) = reference.date else {
            return reference.raw.clone();
        };
        let Some(shown) = date.checked_to_offset(self.offset) else {
            return reference.raw.clone();
        };
        match shown.format(format_description!("[year]/[month]/[day]")) {
            Ok(day) => format!("{day} ({}日経過)", elapsed_days(date, now)),
            Err(_) => reference.raw.clone(),
        }
    }
}

/// Whole days from `reference` to `now`, floored. Negative when `reference` is
/// in the future.
pub fn elapsed_days(reference: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let ms = (now - reference).whole_milliseconds();
    ms.div_euclid(MS_PER_DAY) as i64
}

/// `2024-01-01T10:00` → `2024/01/01 10:00`.
fn normalize_separators(raw: &str) -> String {
    raw.replace('-', "/").replacen('T', " ", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    fn event(ts: &str, loc: &str, desc: &str) -> HistoryEvent {
        HistoryEvent {
            timestamp: ts.into(),
            location: loc.into(),
            description: desc.into(),
        }
    }

    #[test]
    fn empty_history_uses_last_updated() {
        let out = HistoryFormatter::default().format(&[], "2024-01-01");
        assert!(out.entries.is_empty());
        assert_eq!(out.reference.raw, "2024-01-01");
        assert_eq!(out.reference.date, Some(datetime!(2024-01-01 0:00 UTC)));
    }

    #[test]
    fn entries_follow_input_order() {
        let history = vec![
            event("2024-01-01", "Tokyo", "Picked up"),
            event("2024-01-02 09:15", "Osaka", "Arrived at hub"),
        ];
        let out = HistoryFormatter::default().format(&history, "2024-01-05");
        assert_eq!(
            out.entries,
            vec![
                "2024-01-01 - Tokyo: Picked up".to_string(),
                "2024-01-02 09:15 - Osaka: Arrived at hub".to_string(),
            ]
        );
        assert_eq!(out.reference.raw, "2024-01-01");
    }

    #[test]
    fn parses_the_timestamp_shapes_the_backend_emits() {
        let f = HistoryFormatter::default();
        assert_eq!(
            f.parse_timestamp("2024-04-20 10:30"),
            Some(datetime!(2024-04-20 10:30 UTC))
        );
        assert_eq!(
            f.parse_timestamp("2024/04/20 10:30:05"),
            Some(datetime!(2024-04-20 10:30:05 UTC))
        );
        assert_eq!(
            f.parse_timestamp("2024-04-20T10:30:00+08:00"),
            Some(datetime!(2024-04-20 10:30 +8))
        );
        assert_eq!(
            f.parse_timestamp("2024-04-20T10:30"),
            Some(datetime!(2024-04-20 10:30 UTC))
        );
    }

    #[test]
    fn naive_timestamps_take_the_formatter_offset() {
        let jst = UtcOffset::from_hms(9, 0, 0).unwrap();
        let f = HistoryFormatter::new(jst);
        assert_eq!(
            f.parse_timestamp("2024-04-20 10:30"),
            Some(datetime!(2024-04-20 10:30 +9))
        );
    }

    #[test]
    fn malformed_reference_falls_back_to_raw_string() {
        let f = HistoryFormatter::default();
        let history = vec![event("yesterday-ish", "?", "??")];
        let out = f.format(&history, "2024-01-01");
        assert_eq!(out.reference.date, None);
        assert_eq!(out.reference.raw, "yesterday-ish");
        assert_eq!(
            f.date_label(&out.reference, datetime!(2024-01-10 0:00 UTC)),
            "yesterday-ish"
        );
    }

    #[test]
    fn unparseable_reference_is_logged_as_a_warning() {
        let (out, logged) = crate::logging::tests::capture_logs(|| {
            HistoryFormatter::default().format(&[], "sometime soon")
        });
        assert_eq!(out.reference.date, None);
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("unparseable reference date"), "{logged}");
        assert!(logged.contains("sometime soon"), "{logged}");
    }

    #[test]
    fn reference_outside_displayable_range_falls_back_to_raw_string() {
        let f = HistoryFormatter::default();
        let out = f.format(&[], "9999-12-31T23:00:00-05:00");
        assert!(out.reference.date.is_some());
        assert_eq!(
            f.date_label(&out.reference, datetime!(2024-01-10 0:00 UTC)),
            "9999-12-31T23:00:00-05:00"
        );
    }

    #[test]
    fn date_label_includes_elapsed_days() {
        let f = HistoryFormatter::default();
        let out = f.format(&[], "2024-01-01");
        assert_eq!(
            f.date_label(&out.reference, datetime!(2024-01-04 12:00 UTC)),
            "2024/01/01 (3日経過)"
        );
    }

    #[test]
    fn elapsed_days_floors_and_passes_negatives_through() {
        let reference = datetime!(2024-01-10 12:00 UTC);
        assert_eq!(elapsed_days(reference, datetime!(2024-01-11 11:59 UTC)), 0);
        assert_eq!(elapsed_days(reference, datetime!(2024-01-12 12:00 UTC)), 2);
        // 1 ms before the reference floors to -1, not 0.
        assert_eq!(
            elapsed_days(reference, datetime!(2024-01-10 11:59:59.999 UTC)),
            -1
        );
        assert_eq!(elapsed_days(reference, datetime!(2024-01-07 12:00 UTC)), -3);
    }
}
