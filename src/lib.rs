//! Tiled basemap viewer that reads out the cartographic scale of the current
//! view, jumps to preset scales, measures click-drawn polylines and adapts its
//! panel layout to narrow screens.
//!
//! The library holds the state and math; the `quickscale-map` binary renders
//! it with egui and provides the pan/zoom map widget.

pub mod config;
pub mod geo;
pub mod hud;
pub mod layout;
pub mod map_widget;
pub mod measure;
pub mod prefs;
pub mod ribbon;
pub mod scale;
pub mod schedule;
pub mod theme;
pub mod tiles;
pub mod viewer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConfigError, ViewerConfig};
pub use geo::LatLng;
pub use map_widget::{ControlCorner, Layer, LayerId, MapCursor, MapEvent, MapWidget};
pub use prefs::{MemoryStore, PreferenceStore};
pub use theme::Theme;
pub use viewer::Viewer;
