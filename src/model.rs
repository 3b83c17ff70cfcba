use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::map::MapConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
    #[serde(skip)]
    pub map: MapConfig,
}

/// Tracking record as returned by `GET /api/track/{tracking_number}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub tracking_number: String,
    #[serde(default)]
    pub item_name: String,
    pub status: String,
    #[serde(default)]
    pub status_class: Option<String>,
    pub last_updated: String,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
    /// Kept as raw JSON: the backend may send `null`, a partial object or
    /// coordinates of the wrong type, and none of that may fail decoding.
    #[serde(default)]
    pub current_location: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub timestamp: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidPosition {
    #[error("no location reported")]
    Absent,
    #[error("location is not an object: {0}")]
    NotAnObject(serde_json::Value),
    #[error("location field `{field}` is missing or not a number")]
    BadField { field: &'static str },
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate a raw `current_location` value.
    pub fn from_location(location: Option<&serde_json::Value>) -> Result<Self, InvalidPosition> {
        let value = match location {
            None | Some(serde_json::Value::Null) => return Err(InvalidPosition::Absent),
            Some(v) => v,
        };
        let obj = value
            .as_object()
            .ok_or_else(|| InvalidPosition::NotAnObject(value.clone()))?;
        let coord = |field: &'static str| {
            obj.get(field)
                .filter(|v| v.is_number())
                .and_then(|v| v.as_f64())
                .filter(|v| v.is_finite())
                .ok_or(InvalidPosition::BadField { field })
        };
        Ok(Self {
            lat: coord("lat")?,
            lng: coord("lng")?,
        })
    }
}

/// Body of `POST /api/track`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub tracking_number: String,
    pub item_name: String,
}

/// Registration acknowledgment. The backend echoes whatever it knows about the
/// parcel, so the body is kept opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterAck(pub serde_json::Value);

/// Error body returned by the backend on non-OK responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TrackEvent {
    Registered {
        tracking_number: String,
    },
    Snapshot(Box<TrackingSnapshot>),
    RequestFailed(String),
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Registering { tracking_number: String },
    Fetching { tracking_number: String },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Registering { tracking_number } => {
                format!("Registering {tracking_number}…")
            }
            InfoEvent::Fetching { tracking_number } => {
                format!("Fetching {tracking_number}…")
            }
        }
    }
}
