//! Click-to-measure polyline tool.
//!
//! While measuring, every click on the map appends a vertex, drops a small
//! circle marker on it and extends the line. The running length is the sum of
//! great-circle distances between consecutive vertices. Points are only ever
//! removed all at once by [`MeasureTool::clear`].

use crate::geo::LatLng;
use crate::map_widget::{Layer, LayerId, MapCursor, MapWidget};
use serde::{Deserialize, Serialize};

pub const EMPTY_LENGTH_LABEL: &str = "0 m";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureStyle {
    pub marker_radius: f32,
    pub marker_weight: f32,
    pub line_weight: f32,
}

impl Default for MeasureStyle {
    fn default() -> Self {
        Self {
            marker_radius: 4.0,
            marker_weight: 2.0,
            line_weight: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeasureMode {
    #[default]
    Idle,
    Measuring,
}

/// Formats a length as meters below one kilometer, kilometers otherwise.
pub fn format_meters(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.1} m")
    } else {
        format!("{:.3} km", meters / 1000.0)
    }
}

#[derive(Debug, Clone)]
pub struct MeasureTool {
    style: MeasureStyle,
    mode: MeasureMode,
    points: Vec<LatLng>,
    markers: Vec<LayerId>,
    line: Option<LayerId>,
    total: f64,
    length_label: String,
}

impl MeasureTool {
    pub fn new(style: MeasureStyle) -> Self {
        Self {
            style,
            mode: MeasureMode::Idle,
            points: Vec::new(),
            markers: Vec::new(),
            line: None,
            total: 0.0,
            length_label: EMPTY_LENGTH_LABEL.to_owned(),
        }
    }

    pub fn mode(&self) -> MeasureMode {
        self.mode
    }

    pub fn is_measuring(&self) -> bool {
        self.mode == MeasureMode::Measuring
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn has_line(&self) -> bool {
        self.line.is_some()
    }

    /// Total length in meters.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn length_label(&self) -> &str {
        &self.length_label
    }

    /// Flips between idle and measuring. Points are kept.
    pub fn toggle(&mut self, map: &mut impl MapWidget) -> MeasureMode {
        let next = match self.mode {
            MeasureMode::Idle => MeasureMode::Measuring,
            MeasureMode::Measuring => MeasureMode::Idle,
        };
        self.set_mode(next, map);
        next
    }

    /// Leaves measuring mode without clearing (double-click on the map).
    pub fn stop(&mut self, map: &mut impl MapWidget) {
        self.set_mode(MeasureMode::Idle, map);
    }

    /// Removes every marker and the line, resets the label and goes idle.
    pub fn clear(&mut self, map: &mut impl MapWidget) {
        self.points.clear();
        self.total = 0.0;
        self.length_label = EMPTY_LENGTH_LABEL.to_owned();

        if let Some(line) = self.line.take() {
            map.remove_layer(line);
        }
        for marker in self.markers.drain(..) {
            map.remove_layer(marker);
        }

        if self.is_measuring() {
            self.set_mode(MeasureMode::Idle, map);
        }
    }

    /// Handles a single click. Ignored unless measuring.
    pub fn on_click(&mut self, map: &mut impl MapWidget, at: LatLng) {
        if !self.is_measuring() {
            return;
        }

        self.points.push(at);
        self.markers.push(map.add_layer(Layer::CircleMarker {
            center: at,
            radius: self.style.marker_radius,
            weight: self.style.marker_weight,
        }));

        if self.line.is_none() {
            self.line = Some(map.add_layer(self.line_layer()));
        }
        self.recompute_length(map);
    }

    fn recompute_length(&mut self, map: &mut impl MapWidget) {
        self.total = self
            .points
            .windows(2)
            .map(|pair| map.distance(pair[0], pair[1]))
            .fold(0.0, |total, meters| total + meters);
        self.length_label = format_meters(self.total);

        if let Some(line) = self.line {
            map.update_layer(line, self.line_layer());
        }
    }

    fn line_layer(&self) -> Layer {
        Layer::Polyline {
            points: self.points.clone(),
            weight: self.style.line_weight,
        }
    }

    fn set_mode(&mut self, mode: MeasureMode, map: &mut impl MapWidget) {
        self.mode = mode;
        map.set_cursor(match mode {
            MeasureMode::Idle => MapCursor::Grab,
            MeasureMode::Measuring => MapCursor::Crosshair,
        });
    }
}

impl Default for MeasureTool {
    fn default() -> Self {
        Self::new(MeasureStyle::default())
    }
}
