//! In-memory map widget for tests. Built for this crate's unit tests and,
//! with the `testing` feature, for integration tests.

use crate::geo::LatLng;
use crate::map_widget::{ControlCorner, Layer, LayerId, MapCursor, MapEvent, MapWidget};
use std::collections::BTreeMap;

pub struct FakeMap {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub layers: BTreeMap<LayerId, Layer>,
    pub next_id: u64,
    pub events: Vec<MapEvent>,
    pub invalidations: usize,
    pub zoom_control: ControlCorner,
    pub cursor: MapCursor,
}

impl Default for FakeMap {
    fn default() -> Self {
        Self {
            center: LatLng::new(19.4326, -99.1332),
            zoom: 12.0,
            min_zoom: 0.0,
            max_zoom: 20.0,
            layers: BTreeMap::new(),
            next_id: 0,
            events: Vec::new(),
            invalidations: 0,
            zoom_control: ControlCorner::TopRight,
            cursor: MapCursor::Grab,
        }
    }
}

impl FakeMap {
    /// A map that has already reported [`MapEvent::Ready`].
    pub fn ready() -> Self {
        Self {
            events: vec![MapEvent::Ready],
            ..Self::default()
        }
    }

    pub fn click(&mut self, at: LatLng) {
        self.events.push(MapEvent::Click(at));
    }

    pub fn pan_to(&mut self, center: LatLng) {
        self.center = center;
        self.events.push(MapEvent::Move);
    }

    pub fn count(&self, pred: impl Fn(&Layer) -> bool) -> usize {
        self.layers.values().filter(|layer| pred(layer)).count()
    }

    pub fn tile_layers(&self) -> Vec<String> {
        self.layers
            .values()
            .filter_map(|layer| match layer {
                Layer::Tiles(source) => Some(source.name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn markers(&self) -> usize {
        self.layers
            .values()
            .filter(|layer| matches!(layer, Layer::CircleMarker { .. }))
            .count()
    }

    pub fn polyline(&self) -> Option<&[LatLng]> {
        self.layers.values().find_map(|layer| match layer {
            Layer::Polyline { points, .. } => Some(points.as_slice()),
            _ => None,
        })
    }
}

impl MapWidget for FakeMap {
    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.events.push(MapEvent::Zoom);
    }

    fn invalidate_size(&mut self) {
        self.invalidations += 1;
    }

    fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.insert(id, layer);
        id
    }

    fn update_layer(&mut self, id: LayerId, layer: Layer) {
        if let Some(slot) = self.layers.get_mut(&id) {
            *slot = layer;
        }
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.layers.remove(&id);
    }

    fn set_zoom_control_position(&mut self, corner: ControlCorner) {
        self.zoom_control = corner;
    }

    fn set_cursor(&mut self, cursor: MapCursor) {
        self.cursor = cursor;
    }
}
