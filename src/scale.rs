//! Conversion between zoom levels and cartographic scale denominators.
//!
//! The resolution of a Web Mercator tile pyramid at the equator is
//! `2πR / (256 · 2^zoom)` meters per pixel and shrinks with the cosine of the
//! latitude. Multiplying by the screen DPI and dividing by the length of an
//! inch gives the `N` of a `1:N` scale.

use std::f64::consts::PI;

/// Equatorial radius of the WGS84 ellipsoid in meters.
pub const EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// Tile edge length the resolution formula is based on.
pub const TILE_PIXELS: f64 = 256.0;

pub const METERS_PER_INCH: f64 = 0.0254;

/// DPI of a screen with a device pixel ratio of 1.
pub const BASE_DPI: f64 = 96.0;

fn equatorial_circumference() -> f64 {
    2.0 * PI * EQUATORIAL_RADIUS
}

/// Ground resolution in meters per pixel at `lat` degrees and `zoom`.
pub fn meters_per_pixel(lat: f64, zoom: f64) -> f64 {
    let res_eq = equatorial_circumference() / (TILE_PIXELS * 2f64.powf(zoom));
    res_eq * lat.to_radians().cos()
}

/// Scale denominator shown at `zoom` on a screen with `dpi` dots per inch.
pub fn scale_from_zoom(lat: f64, zoom: f64, dpi: u32) -> f64 {
    meters_per_pixel(lat, zoom) * f64::from(dpi) / METERS_PER_INCH
}

/// Zoom level at which the map shows `1:scale`. Inverse of [`scale_from_zoom`].
pub fn zoom_from_scale(lat: f64, scale: f64, dpi: u32) -> f64 {
    let target_mpp = scale * METERS_PER_INCH / f64::from(dpi);
    let res_eq = target_mpp / lat.to_radians().cos();
    (equatorial_circumference() / (TILE_PIXELS * res_eq)).log2()
}

/// Estimates the screen DPI from the device pixel ratio.
pub fn auto_dpi(pixel_ratio: f32) -> u32 {
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        f64::from(pixel_ratio)
    } else {
        1.0
    };
    (BASE_DPI * ratio).round().max(1.0) as u32
}

/// Short ribbon label for a preset scale: `1:5k`, `1:500`.
pub fn human_scale(denominator: u32) -> String {
    if denominator >= 1000 {
        format!("1:{}k", (f64::from(denominator) / 1000.0).round() as u64)
    } else {
        format!("1:{denominator}")
    }
}

/// Formats an integer with `,` thousands separators.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// HUD label for a computed scale, rounded to the nearest hundred.
pub fn hud_scale_label(scale: f64) -> String {
    let rounded = ((scale / 100.0).round() * 100.0).max(0.0) as u64;
    format!("1:{}", group_thousands(rounded))
}

/// Default maximum width of the scale bar in pixels.
pub const SCALE_BAR_MAX_WIDTH: f32 = 100.0;

/// A metric scale bar: a round ground length and the on-screen width that
/// represents it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub meters: f64,
    pub width: f32,
    pub label: String,
}

impl ScaleBar {
    /// Builds the bar given the ground distance covered by `max_width` pixels.
    pub fn metric(max_meters: f64, max_width: f32) -> Option<Self> {
        if !(max_meters.is_finite() && max_meters > 0.0) {
            return None;
        }

        let meters = round_length(max_meters);
        let label = if meters < 1000.0 {
            format!("{meters} m")
        } else {
            format!("{} km", meters / 1000.0)
        };
        let width = (f64::from(max_width) * meters / max_meters).round() as f32;

        Some(Self {
            meters,
            width,
            label,
        })
    }
}

/// Largest 1, 2, 3 or 5 times a power of ten that does not exceed `num`.
fn round_length(num: f64) -> f64 {
    let integer_digits = (num.floor().max(0.0) as u64).to_string().len() as i32;
    let pow10 = 10f64.powi(integer_digits - 1);
    let d = num / pow10;
    let d = if d >= 10.0 {
        10.0
    } else if d >= 5.0 {
        5.0
    } else if d >= 3.0 {
        3.0
    } else if d >= 2.0 {
        2.0
    } else {
        1.0
    };
    pow10 * d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_scale_round_trip() {
        for lat in [-84.0, -45.5, -10.0, 0.0, 19.4326, 52.52, 84.9] {
            for zoom in [0.0, 1.5, 7.0, 12.0, 15.37, 20.0] {
                for dpi in [72, 96, 144, 192, 288] {
                    let scale = scale_from_zoom(lat, zoom, dpi);
                    let back = zoom_from_scale(lat, scale, dpi);
                    assert!(
                        (back - zoom).abs() < 1e-9,
                        "lat={lat} zoom={zoom} dpi={dpi} got {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn scale_strictly_decreases_with_zoom() {
        for lat in [-60.0, 0.0, 19.4326, 70.0] {
            let mut previous = f64::INFINITY;
            for step in 0..=200 {
                let zoom = f64::from(step) * 0.1;
                let scale = scale_from_zoom(lat, zoom, 96);
                assert!(scale > 0.0);
                assert!(scale < previous, "lat={lat} zoom={zoom}");
                previous = scale;
            }
        }
    }

    #[test]
    fn equator_resolution_at_zoom_zero() {
        let mpp = meters_per_pixel(0.0, 0.0);
        assert!((mpp - 156_543.033_928_041).abs() < 1e-6);
    }

    #[test]
    fn preset_scale_reproduces_itself() {
        let lat = 19.4326;
        let zoom = zoom_from_scale(lat, 10_000.0, 96);
        let scale = scale_from_zoom(lat, zoom, 96);
        assert!((scale - 10_000.0).abs() < 0.5);
        // Zoom snapping to 0.01 still lands close to the preset.
        let snapped = (zoom * 100.0).round() / 100.0;
        let scale = scale_from_zoom(lat, snapped, 96);
        assert!((scale - 10_000.0).abs() / 10_000.0 < 0.01);
    }

    #[test]
    fn human_labels() {
        assert_eq!(human_scale(1000), "1:1k");
        assert_eq!(human_scale(500), "1:500");
        assert_eq!(human_scale(5000), "1:5k");
        assert_eq!(human_scale(100_000), "1:100k");
        assert_eq!(human_scale(2500), "1:3k");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(72_224), "72,224");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn hud_label_rounds_to_hundreds() {
        assert_eq!(hud_scale_label(72_224.7), "1:72,200");
        assert_eq!(hud_scale_label(72_250.0), "1:72,300");
        assert_eq!(hud_scale_label(49.0), "1:0");
    }

    #[test]
    fn dpi_from_pixel_ratio() {
        assert_eq!(auto_dpi(1.0), 96);
        assert_eq!(auto_dpi(2.0), 192);
        assert_eq!(auto_dpi(1.25), 120);
        assert_eq!(auto_dpi(0.0), 96);
        assert_eq!(auto_dpi(f32::NAN), 96);
    }

    #[test]
    fn scale_bar_picks_round_lengths() {
        let bar = ScaleBar::metric(137.0, 100.0).unwrap();
        assert_eq!(bar.meters, 100.0);
        assert_eq!(bar.label, "100 m");
        assert_eq!(bar.width, 73.0);

        let bar = ScaleBar::metric(4_200.0, 100.0).unwrap();
        assert_eq!(bar.meters, 3_000.0);
        assert_eq!(bar.label, "3 km");

        let bar = ScaleBar::metric(0.4, 100.0).unwrap();
        assert_eq!(bar.meters, 1.0);

        assert!(ScaleBar::metric(0.0, 100.0).is_none());
    }
}
