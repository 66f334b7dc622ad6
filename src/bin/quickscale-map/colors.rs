//! Colors for map overlays and panel accents.

use eframe::egui::Color32;

// Measurement overlay
pub const MEASURE_STROKE: Color32 = Color32::from_rgb(0x33, 0x88, 0xff);
pub const MEASURE_FILL: Color32 = Color32::from_rgba_premultiplied(0x0a, 0x1b, 0x33, 0x33);

// Scale bar
pub const SCALE_BAR_LIGHT: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 190);
pub const SCALE_BAR_DARK: Color32 = Color32::from_rgba_premultiplied(24, 24, 24, 190);

// Map background while tiles load
pub const MAP_BACKGROUND_LIGHT: Color32 = Color32::from_rgb(0xdd, 0xdd, 0xdd);
pub const MAP_BACKGROUND_DARK: Color32 = Color32::from_rgb(0x1b, 0x1b, 0x1d);

/// Active quick-scale button.
pub const ACTIVE_ACCENT: Color32 = Color32::from_rgb(0x33, 0x88, 0xff);
