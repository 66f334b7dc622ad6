//! Preset scale shortcuts.

use crate::map_widget::MapWidget;
use crate::scale::{group_thousands, human_scale, zoom_from_scale};

/// Preset scale denominators offered by default.
pub const QUICK_SCALES: [u32; 5] = [1_000, 5_000, 10_000, 50_000, 100_000];

#[derive(Debug, Clone, PartialEq)]
pub struct RibbonButton {
    pub denominator: u32,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ScaleRibbon {
    buttons: Vec<RibbonButton>,
    active: Option<usize>,
    selected_label: String,
}

impl ScaleRibbon {
    pub fn new(scales: &[u32]) -> Self {
        let buttons = scales
            .iter()
            .map(|&denominator| RibbonButton {
                denominator,
                label: human_scale(denominator),
            })
            .collect();
        Self {
            buttons,
            active: None,
            selected_label: "—".to_owned(),
        }
    }

    pub fn buttons(&self) -> &[RibbonButton] {
        &self.buttons
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    pub fn selected_label(&self) -> &str {
        &self.selected_label
    }

    /// Highlights the button at `index` and zooms the map to its scale at the
    /// current center latitude. Returns the zoom that was requested.
    pub fn select(&mut self, index: usize, map: &mut impl MapWidget, dpi: u32) -> Option<f64> {
        let denominator = self.buttons.get(index)?.denominator;

        self.active = Some(index);
        self.selected_label = format!("1:{}", group_thousands(u64::from(denominator)));

        let zoom = zoom_from_scale(map.center().lat, f64::from(denominator), dpi);
        log::debug!("Quick scale 1:{denominator} -> zoom {zoom:.3} at {dpi} dpi");
        map.set_zoom(zoom);
        Some(zoom)
    }
}

impl Default for ScaleRibbon {
    fn default() -> Self {
        Self::new(&QUICK_SCALES)
    }
}
