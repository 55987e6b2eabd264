use crate::extent::Extent;
use crate::projection::{Coordinate, HALF_WORLD, from_lon_lat};

/// Size of one tile edge in pixels for the XYZ grid.
pub const TILE_SIZE: f64 = 256.0;
/// Metres per pixel at zoom 0.
pub const MAX_RESOLUTION: f64 = 2.0 * HALF_WORLD / TILE_SIZE;
pub const MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 19.0;
const ZOOM_SENSITIVITY: f64 = 0.002;

pub fn resolution_for_zoom(zoom: f64) -> f64 {
    MAX_RESOLUTION / 2f64.powf(zoom)
}

pub fn zoom_for_resolution(resolution: f64) -> f64 {
    (MAX_RESOLUTION / resolution).log2()
}

/// The visible part of the map: a center in projected coordinates and a resolution
/// in metres per CSS pixel. Screen `y` grows downward, map `y` grows northward.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub resolution: f64,
    max_zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Coordinate::default(),
            resolution: MAX_RESOLUTION,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl MapView {
    /// View centered on `[lon, lat]` at `zoom`.
    pub fn new(center_lon_lat: [f64; 2], zoom: f64, max_zoom: f64) -> Self {
        let max_zoom = max_zoom.max(MIN_ZOOM);
        Self {
            center: from_lon_lat(center_lon_lat[0], center_lon_lat[1]),
            resolution: resolution_for_zoom(zoom.clamp(MIN_ZOOM, max_zoom)),
            max_zoom,
        }
    }

    pub fn zoom(&self) -> f64 {
        zoom_for_resolution(self.resolution)
    }

    fn clamp_resolution(&self, resolution: f64) -> f64 {
        resolution.clamp(resolution_for_zoom(self.max_zoom), MAX_RESOLUTION)
    }

    /// Convert a map coordinate to a pixel offset inside a `size` viewport.
    pub fn coordinate_to_pixel(&self, c: Coordinate, size: (f64, f64)) -> (f64, f64) {
        (
            (c.x - self.center.x) / self.resolution + size.0 / 2.0,
            (self.center.y - c.y) / self.resolution + size.1 / 2.0,
        )
    }

    /// Convert a pixel offset inside a `size` viewport to a map coordinate.
    pub fn pixel_to_coordinate(&self, px: (f64, f64), size: (f64, f64)) -> Coordinate {
        Coordinate::new(
            self.center.x + (px.0 - size.0 / 2.0) * self.resolution,
            self.center.y - (px.1 - size.1 / 2.0) * self.resolution,
        )
    }

    /// Map area covered by a `size` viewport.
    pub fn visible_extent(&self, size: (f64, f64)) -> Extent {
        let half_w = size.0 / 2.0 * self.resolution;
        let half_h = size.1 / 2.0 * self.resolution;
        Extent::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    /// Center on `extent` at the smallest resolution that keeps it inside `size`
    /// minus `padding` pixels on every side. A point extent ends at max zoom.
    ///
    /// Padding never takes more than a quarter of either axis. The view cannot zoom out past
    /// zoom 0, so an axis too short to show the extent even then leaves it partly outside.
    pub fn fit(&mut self, extent: &Extent, size: (f64, f64), padding: f64) {
        if extent.is_empty() || size.0 <= 0.0 || size.1 <= 0.0 {
            return;
        }
        let padding = padding.max(0.0);
        let avail_w = (size.0 - 2.0 * padding.min(size.0 / 4.0)).max(1.0);
        let avail_h = (size.1 - 2.0 * padding.min(size.1 / 4.0)).max(1.0);
        let resolution = (extent.width() / avail_w).max(extent.height() / avail_h);
        self.resolution = self.clamp_resolution(resolution);
        self.center = extent.center();
    }

    /// Pan by a screen-space drag delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center.x -= dx * self.resolution;
        self.center.y += dy * self.resolution;
    }

    /// Zoom toward a focus pixel; `delta` follows wheel semantics (positive zooms out).
    pub fn zoom_at(&mut self, delta: f64, px: (f64, f64), size: (f64, f64)) {
        let anchor = self.pixel_to_coordinate(px, size);
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let resolution = self.clamp_resolution(self.resolution / factor);

        // Keep the coordinate under the cursor fixed
        self.center.x = anchor.x - (px.0 - size.0 / 2.0) * resolution;
        self.center.y = anchor.y + (px.1 - size.1 / 2.0) * resolution;
        self.resolution = resolution;
    }
}
