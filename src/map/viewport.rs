use super::{MapBackend, MapView, TileLayer};
use crate::model::Position;

/// In-memory map used by the terminal canvas and the text summary.
#[derive(Debug, Default)]
pub struct ViewportBackend {
    maps_created: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportMap {
    pub view: MapView,
    pub tiles: TileLayer,
    pub has_marker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMarker {
    pub position: Position,
}

impl ViewportBackend {
    pub fn maps_created(&self) -> usize {
        self.maps_created
    }
}

impl MapBackend for ViewportBackend {
    type Map = ViewportMap;
    type Marker = ViewportMarker;

    fn create_map(&mut self, view: MapView, tiles: &TileLayer) -> ViewportMap {
        self.maps_created += 1;
        ViewportMap {
            view,
            tiles: tiles.clone(),
            has_marker: false,
        }
    }

    fn add_marker(&mut self, map: &mut ViewportMap, at: Position) -> ViewportMarker {
        map.has_marker = true;
        ViewportMarker { position: at }
    }

    fn move_marker(&mut self, marker: &mut ViewportMarker, at: Position) {
        marker.position = at;
    }

    fn remove_marker(&mut self, map: &mut ViewportMap, _marker: ViewportMarker) {
        map.has_marker = false;
    }

    fn set_view(&mut self, map: &mut ViewportMap, view: MapView) {
        map.view = view;
    }
}

impl ViewportMap {
    /// Longitude/latitude bounds of the visible area for a canvas of the given
    /// aspect ratio (width / height in cells). Terminal cells are coarse, so the
    /// span never drops below `min_span` degrees.
    pub fn bounds(&self, aspect: f64, min_span: f64) -> ([f64; 2], [f64; 2]) {
        let lng_span = (360.0 / 2f64.powi(i32::from(self.view.zoom))).max(min_span);
        let lat_span = (lng_span / aspect.max(0.1)).min(180.0);
        let c = self.view.center;
        (
            [c.lng - lng_span / 2.0, c.lng + lng_span / 2.0],
            [c.lat - lat_span / 2.0, c.lat + lat_span / 2.0],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{MapConfig, MapSync, MarkerUpdate};
    use serde_json::json;

    #[test]
    fn viewport_tracks_marker_and_view() {
        let mut sync = MapSync::new(ViewportBackend::default(), MapConfig::default());
        let h = sync.ensure_map();
        assert_eq!(sync.map().unwrap().view.zoom, 5);
        assert!(!sync.map().unwrap().has_marker);

        let loc = json!({"lat": 31.23, "lng": 121.47});
        sync.update_position(&h, Some(&loc));
        let map = sync.map().unwrap();
        assert!(map.has_marker);
        assert_eq!(map.view.zoom, 13);
        assert_eq!(map.view.center, Position::new(31.23, 121.47));
        assert_eq!(
            sync.marker().unwrap().position,
            Position::new(31.23, 121.47)
        );

        assert_eq!(sync.update_position(&h, None), MarkerUpdate::Cleared);
        assert!(!sync.map().unwrap().has_marker);
        assert_eq!(sync.backend().maps_created(), 1);
    }

    #[test]
    fn bounds_are_centered_and_clamped() {
        let map = ViewportMap {
            view: MapView {
                center: Position::new(10.0, 20.0),
                zoom: 13,
            },
            tiles: TileLayer::default(),
            has_marker: false,
        };
        let (x, y) = map.bounds(2.0, 4.0);
        assert_eq!(x, [18.0, 22.0]);
        assert_eq!(y, [9.0, 11.0]);
    }
}
