//! Viewer configuration, loaded from a RON file.

use crate::geo::{LatLng, MAX_LATITUDE};
use crate::layout::LayoutOptions;
use crate::measure::MeasureStyle;
use crate::ribbon::QUICK_SCALES;
use crate::theme::Basemaps;
use crate::tiles::{MAX_TILE_ZOOM, TemplateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::de::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid basemap '{name}': {source}")]
    Template {
        name: String,
        source: TemplateError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartView {
    pub center: LatLng,
    pub zoom: f64,
}

impl Default for StartView {
    fn default() -> Self {
        Self {
            center: LatLng::new(19.4326, -99.1332),
            zoom: 12.0,
        }
    }
}

/// Interaction options of the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom levels are rounded to a multiple of this.
    pub zoom_snap: f64,
    /// Step of the zoom control buttons.
    pub zoom_delta: f64,
    /// Wheel scroll distance that changes the zoom by one level.
    pub wheel_px_per_zoom_level: f32,
    pub double_click_zoom: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0.0,
            max_zoom: 20.0,
            zoom_snap: 0.01,
            zoom_delta: 0.25,
            wheel_px_per_zoom_level: 120.0,
            double_click_zoom: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub start: StartView,
    pub map: MapOptions,
    /// Preset scale denominators of the scale ribbon, in display order.
    pub quick_scales: Vec<u32>,
    /// Fixed screen DPI. Estimated from the pixel ratio when unset.
    pub dpi: Option<u32>,
    pub basemaps: Basemaps,
    pub layout: LayoutOptions,
    pub measure: MeasureStyle,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            start: StartView::default(),
            map: MapOptions::default(),
            quick_scales: QUICK_SCALES.to_vec(),
            dpi: None,
            basemaps: Basemaps::default(),
            layout: LayoutOptions::default(),
            measure: MeasureStyle::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quick_scales.is_empty() {
            return Err(ConfigError::Invalid("quick_scales is empty".to_owned()));
        }
        if self.quick_scales.contains(&0) {
            return Err(ConfigError::Invalid("quick scale of 0".to_owned()));
        }
        if self.dpi == Some(0) {
            return Err(ConfigError::Invalid("dpi must be positive".to_owned()));
        }
        let deepest = f64::from(MAX_TILE_ZOOM);
        if !(self.map.min_zoom >= 0.0 && self.map.max_zoom <= deepest) {
            return Err(ConfigError::Invalid(format!(
                "zoom bounds must lie within 0..={MAX_TILE_ZOOM}"
            )));
        }
        if !(self.map.min_zoom <= self.map.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "min_zoom {} is above max_zoom {}",
                self.map.min_zoom, self.map.max_zoom
            )));
        }
        if !(self.map.zoom_snap >= 0.0 && self.map.zoom_delta > 0.0) {
            return Err(ConfigError::Invalid(
                "zoom_snap must be >= 0 and zoom_delta > 0".to_owned(),
            ));
        }
        if !(self.map.wheel_px_per_zoom_level > 0.0) {
            return Err(ConfigError::Invalid(
                "wheel_px_per_zoom_level must be positive".to_owned(),
            ));
        }
        if !(self.layout.mobile_breakpoint > 0.0) {
            return Err(ConfigError::Invalid(
                "mobile_breakpoint must be positive".to_owned(),
            ));
        }
        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&self.start.center.lat) {
            return Err(ConfigError::Invalid(format!(
                "start latitude {} is outside ±{MAX_LATITUDE}",
                self.start.center.lat
            )));
        }
        if !self.start.center.lng.is_finite() {
            return Err(ConfigError::Invalid("start longitude is not a number".to_owned()));
        }
        if !(self.map.min_zoom..=self.map.max_zoom).contains(&self.start.zoom) {
            return Err(ConfigError::Invalid(format!(
                "start zoom {} is outside {}..={}",
                self.start.zoom, self.map.min_zoom, self.map.max_zoom
            )));
        }

        for source in [&self.basemaps.light, &self.basemaps.dark] {
            if source.max_zoom > MAX_TILE_ZOOM {
                return Err(ConfigError::Invalid(format!(
                    "basemap '{}' max_zoom {} is above {MAX_TILE_ZOOM}",
                    source.name, source.max_zoom
                )));
            }
            source.template().map_err(|source_err| ConfigError::Template {
                name: source.name.clone(),
                source: source_err,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn bundled_sample_matches_defaults() {
        let sample = include_str!("../assets/viewer.ron");
        let config = ViewerConfig::from_ron(sample).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = ViewerConfig::from_ron("(dpi: Some(144), layout: (resize_debounce: 50))").unwrap();
        assert_eq!(config.dpi, Some(144));
        assert_eq!(config.layout.resize_debounce, Duration::from_millis(50));
        assert_eq!(config.layout.sheet_settle, Duration::from_millis(220));
        assert_eq!(config.quick_scales, QUICK_SCALES.to_vec());
    }

    #[test]
    fn rejects_empty_scales_and_bad_zoom_bounds() {
        assert!(matches!(
            ViewerConfig::from_ron("(quick_scales: [])"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ViewerConfig::from_ron("(map: (min_zoom: 10.0, max_zoom: 2.0))"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_zoom_beyond_tile_addressing() {
        let mut config = ViewerConfig::default();
        config.map.max_zoom = 64.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ViewerConfig::default();
        config.basemaps.light.max_zoom = 64;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unusable_start_view() {
        for zoom in [f64::NAN, f64::INFINITY, -1.0, 21.0] {
            let mut config = ViewerConfig::default();
            config.start.zoom = zoom;
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "zoom {zoom} accepted"
            );
        }

        let mut config = ViewerConfig::default();
        config.start.center.lat = 89.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ViewerConfig::default();
        config.start.center.lat = MAX_LATITUDE;
        assert!(config.validate().is_ok());

        let mut config = ViewerConfig::default();
        config.start.center.lng = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_bad_basemap_template() {
        let mut config = ViewerConfig::default();
        config.basemaps.dark.url = "https://tiles/{z}/{x}.png".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Template { name, .. }) if name == "carto-dark"
        ));
    }

    #[test]
    fn syntax_errors_surface_as_parse_errors() {
        assert!(matches!(
            ViewerConfig::from_ron("(dpi: "),
            Err(ConfigError::Parse(_))
        ));
    }
}
