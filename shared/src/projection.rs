//! Spherical Web Mercator (EPSG:3857), the projection used by OSM raster tiles.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use serde::{Deserialize, Serialize};

/// Sphere radius in metres used by EPSG:3857.
pub const EARTH_RADIUS: f64 = 6_378_137.0;
/// Latitude at which the projected world becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_78;
/// Half the projected world width/height in metres.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// A point in projected map coordinates (metres). `y` grows northward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Project `[longitude, latitude]` in degrees. Latitude is clamped to the Mercator band.
pub fn from_lon_lat(lon: f64, lat: f64) -> Coordinate {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coordinate {
        x: EARTH_RADIUS * lon.to_radians(),
        y: EARTH_RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Inverse of [`from_lon_lat`], returning `(longitude, latitude)` in degrees.
pub fn to_lon_lat(coord: Coordinate) -> (f64, f64) {
    let lon = (coord.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        let diff = (actual - expected).abs();
        assert!(diff < tol, "expected {expected}, got {actual} (diff: {diff})");
    }

    #[test]
    fn origin_maps_to_origin() {
        let c = from_lon_lat(0.0, 0.0);
        assert_close(c.x, 0.0, 1e-9);
        assert_close(c.y, 0.0, 1e-9);
    }

    #[test]
    fn antimeridian_is_half_world() {
        assert_close(from_lon_lat(180.0, 0.0).x, HALF_WORLD, 1e-6);
        assert_close(from_lon_lat(-180.0, 0.0).x, -HALF_WORLD, 1e-6);
    }

    #[test]
    fn max_latitude_is_square() {
        assert_close(from_lon_lat(0.0, MAX_LATITUDE).y, HALF_WORLD, 1e-3);
    }

    #[test]
    fn known_point_lyon() {
        // Reference values from EPSG:3857 for 4.8552E 45.7774N.
        let c = from_lon_lat(4.8552, 45.7774);
        assert_close(c.x, 540_478.39, 0.01);
        assert_close(c.y, 5_744_748.89, 0.01);
    }

    #[test]
    fn poles_are_clamped() {
        let north = from_lon_lat(0.0, 90.0);
        assert!(north.y.is_finite());
        assert_close(north.y, from_lon_lat(0.0, MAX_LATITUDE).y, 1e-6);
    }

    #[test]
    fn round_trip_within_band() {
        for &(lon, lat) in &[
            (4.8552, 45.7774),
            (-9.1393, 38.7223),
            (179.9, -85.0),
            (-179.9, 85.0),
            (0.0, 0.0),
        ] {
            let (lon2, lat2) = to_lon_lat(from_lon_lat(lon, lat));
            assert_close(lon2, lon, 1e-9);
            assert_close(lat2, lat, 1e-9);
        }
    }
}
