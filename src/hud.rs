//! Zoom and scale readout.

use crate::map_widget::MapWidget;
use crate::scale::{hud_scale_label, scale_from_zoom};

#[derive(Debug, Clone)]
pub struct Hud {
    pub zoom_label: String,
    pub scale_label: String,
}

impl Default for Hud {
    fn default() -> Self {
        Self {
            zoom_label: "-".to_owned(),
            scale_label: "-".to_owned(),
        }
    }
}

impl Hud {
    /// Recomputes both labels from the current view.
    pub fn update(&mut self, map: &impl MapWidget, dpi: u32) {
        let zoom = map.zoom();
        let scale = scale_from_zoom(map.center().lat, zoom, dpi);
        self.zoom_label = format!("{zoom:.2}");
        self.scale_label = hud_scale_label(scale);
    }
}
