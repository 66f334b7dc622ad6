//! Geographic coordinates, great-circle distance and Web Mercator projection.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean Earth radius used for great-circle distances, in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_000.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Side of a map tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine distance to `other` in meters.
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let sin_dlat = ((other.lat - self.lat).to_radians() / 2.0).sin();
        let sin_dlng = ((other.lng - self.lng).to_radians() / 2.0).sin();

        let a = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        MEAN_EARTH_RADIUS * c
    }
}

/// Size of the whole world in pixels at a (fractional) zoom level.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Projects a coordinate to world pixels at `zoom`. The origin is the
/// north-west corner of the map, y grows southwards.
pub fn project(latlng: LatLng, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = latlng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (latlng.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_one_degree_of_latitude() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 0.0);
        let expected = MEAN_EARTH_RADIUS * PI / 180.0;
        assert!((a.distance_to(&b) - expected).abs() < 1e-6);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = LatLng::new(19.0, -99.0);
        let b = LatLng::new(19.01, -98.99);
        assert_eq!(a.distance_to(&a), 0.0);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
    }

    #[test]
    fn projection_round_trips() {
        let points = [
            LatLng::new(19.4326, -99.1332),
            LatLng::new(-33.8688, 151.2093),
            LatLng::new(0.0, 0.0),
            LatLng::new(60.0, 179.0),
        ];
        for zoom in [0.0, 3.5, 12.0, 18.25] {
            for p in points {
                let (x, y) = project(p, zoom);
                let back = unproject(x, y, zoom);
                assert!((back.lat - p.lat).abs() < 1e-9, "{p:?} at {zoom}");
                assert!((back.lng - p.lng).abs() < 1e-9, "{p:?} at {zoom}");
            }
        }
    }

    #[test]
    fn equator_meridian_projects_to_world_center() {
        let (x, y) = project(LatLng::new(0.0, 0.0), 2.0);
        assert!((x - 512.0).abs() < 1e-9);
        assert!((y - 512.0).abs() < 1e-9);
    }
}
