//! Application-level orchestration.
//!
//! Owns the request lifecycle (register, fetch, refresh) and reports progress as
//! [`TrackEvent`](crate::model::TrackEvent)s. Rendering stays in the UI/CLI layers.

mod controller;

pub(crate) use controller::{lookup, run_controller, UiCommand};
