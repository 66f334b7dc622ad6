//! The capability the controllers need from a pan/zoom map engine.
//!
//! Any engine that can report its view, jump to a zoom level, measure
//! distances and manage a handful of overlay layers can drive the viewer.
//! Input is reported as a queue of [`MapEvent`]s that the owner drains once
//! per frame.

use crate::geo::LatLng;
use crate::tiles::TileSource;

/// Handle to a layer added with [`MapWidget::add_layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// A tiled basemap.
    Tiles(TileSource),
    /// A small circle at a fixed geographic position.
    CircleMarker {
        center: LatLng,
        radius: f32,
        weight: f32,
    },
    /// An open line through `points` in order.
    Polyline { points: Vec<LatLng>, weight: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// The widget knows its size and can answer view queries.
    Ready,
    /// The center changed.
    Move,
    /// The zoom level changed.
    Zoom,
    Click(LatLng),
    DoubleClick(LatLng),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlCorner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapCursor {
    #[default]
    Grab,
    Crosshair,
}

pub trait MapWidget {
    fn center(&self) -> LatLng;

    fn zoom(&self) -> f64;

    /// Jumps to `zoom`, clamped to the widget's bounds.
    fn set_zoom(&mut self, zoom: f64);

    /// Great-circle distance in meters.
    fn distance(&self, a: LatLng, b: LatLng) -> f64 {
        a.distance_to(&b)
    }

    /// Drops the cached container size so the next frame measures it again.
    fn invalidate_size(&mut self);

    /// Removes and returns every event queued since the last call.
    fn take_events(&mut self) -> Vec<MapEvent>;

    fn is_ready(&self) -> bool;

    fn add_layer(&mut self, layer: Layer) -> LayerId;

    /// Replaces the contents of an existing layer. Unknown ids are ignored.
    fn update_layer(&mut self, id: LayerId, layer: Layer);

    fn remove_layer(&mut self, id: LayerId);

    fn set_zoom_control_position(&mut self, corner: ControlCorner);

    fn set_cursor(&mut self, cursor: MapCursor);
}
