//! Map and marker synchronization.
//!
//! [`MapSync`] owns at most one map and one marker for the whole session. The map
//! is created once and never rebuilt; the marker is created on the first valid
//! position and moved in place afterwards.

mod viewport;

pub use viewport::{ViewportBackend, ViewportMap, ViewportMarker};

use crate::model::Position;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            max_zoom: 19,
            attribution: "© OpenStreetMap contributors".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: Position,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Initial overview, before any position is known.
    pub initial_view: MapView,
    /// Zoom used when centering on a reported position.
    pub focus_zoom: u8,
    pub tiles: TileLayer,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // Tokyo
            initial_view: MapView {
                center: Position::new(35.6895, 139.6917),
                zoom: 5,
            },
            focus_zoom: 13,
            tiles: TileLayer::default(),
        }
    }
}

/// Map widget primitives.
pub trait MapBackend {
    type Map;
    type Marker;

    fn create_map(&mut self, view: MapView, tiles: &TileLayer) -> Self::Map;
    fn add_marker(&mut self, map: &mut Self::Map, at: Position) -> Self::Marker;
    fn move_marker(&mut self, marker: &mut Self::Marker, at: Position);
    fn remove_marker(&mut self, map: &mut Self::Map, marker: Self::Marker);
    fn set_view(&mut self, map: &mut Self::Map, view: MapView);
}

/// Proof that the map has been created. Only [`MapSync::ensure_map`] hands these out.
#[derive(Debug, Clone, Copy)]
pub struct MapHandle {
    _private: (),
}

/// What a call to [`MapSync::update_position`] did to the marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MarkerUpdate {
    Created { at: Position },
    Moved { at: Position },
    Cleared,
    Unchanged,
}

struct MapState<M, K> {
    map: M,
    marker: Option<K>,
}

pub struct MapSync<B: MapBackend> {
    backend: B,
    config: MapConfig,
    state: Option<MapState<B::Map, B::Marker>>,
}

impl<B: MapBackend> MapSync<B> {
    pub fn new(backend: B, config: MapConfig) -> Self {
        Self {
            backend,
            config,
            state: None,
        }
    }

    /// Create the map if needed. Repeated calls return a handle to the same map.
    pub fn ensure_map(&mut self) -> MapHandle {
        if self.state.is_none() {
            tracing::debug!(
                lat = self.config.initial_view.center.lat,
                lng = self.config.initial_view.center.lng,
                zoom = self.config.initial_view.zoom,
                "creating map"
            );
            let map = self
                .backend
                .create_map(self.config.initial_view, &self.config.tiles);
            self.state = Some(MapState { map, marker: None });
        }
        MapHandle { _private: () }
    }

    /// Show `location` on the map, or clear the marker when it is absent or invalid.
    pub fn update_position(
        &mut self,
        _handle: &MapHandle,
        location: Option<&serde_json::Value>,
    ) -> MarkerUpdate {
        let focus_zoom = self.config.focus_zoom;
        let Some(state) = self.state.as_mut() else {
            tracing::warn!("map not initialized, ignoring position update");
            return MarkerUpdate::Unchanged;
        };

        let at = match Position::from_location(location) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "invalid location data");
                return match state.marker.take() {
                    Some(marker) => {
                        self.backend.remove_marker(&mut state.map, marker);
                        MarkerUpdate::Cleared
                    }
                    None => MarkerUpdate::Unchanged,
                };
            }
        };

        let update = match state.marker.as_mut() {
            Some(marker) => {
                self.backend.move_marker(marker, at);
                MarkerUpdate::Moved { at }
            }
            None => {
                let marker = self.backend.add_marker(&mut state.map, at);
                state.marker = Some(marker);
                MarkerUpdate::Created { at }
            }
        };
        self.backend.set_view(
            &mut state.map,
            MapView {
                center: at,
                zoom: focus_zoom,
            },
        );
        update
    }

    pub fn map(&self) -> Option<&B::Map> {
        self.state.as_ref().map(|s| &s.map)
    }

    pub fn marker(&self) -> Option<&B::Marker> {
        self.state.as_ref().and_then(|s| s.marker.as_ref())
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
