use crate::extent::Extent;
use crate::projection::HALF_WORLD;
use crate::view::{MAX_RESOLUTION, zoom_for_resolution};

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Address of one tile in the XYZ scheme (origin top-left, `y` grows southward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

/// Inclusive range of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub z: u8,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRange {
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.min_y..=self.max_y)
            .flat_map(move |y| (self.min_x..=self.max_x).map(move |x| TileCoord::new(self.z, x, y)))
    }
}

fn tiles_per_side(z: u8) -> u32 {
    1u32 << z
}

/// Tile zoom level that best matches a view resolution, clamped to `[0, max_zoom]`.
pub fn tile_zoom_for_resolution(resolution: f64, max_zoom: u8) -> u8 {
    let z = zoom_for_resolution(resolution.min(MAX_RESOLUTION)).round();
    if !z.is_finite() || z < 0.0 {
        return 0;
    }
    (z as u32).min(max_zoom as u32) as u8
}

/// Tiles at zoom `z` covering `extent`, or `None` if the extent misses the world.
pub fn tile_range(extent: &Extent, z: u8) -> Option<TileRange> {
    let world = Extent::new(-HALF_WORLD, -HALF_WORLD, HALF_WORLD, HALF_WORLD);
    if extent.is_empty() || !world.intersects(extent) {
        return None;
    }
    let n = tiles_per_side(z);
    let tile_span = 2.0 * HALF_WORLD / n as f64;
    let col = |x: f64| (((x + HALF_WORLD) / tile_span).floor().max(0.0) as u32).min(n - 1);
    let row = |y: f64| (((HALF_WORLD - y) / tile_span).floor().max(0.0) as u32).min(n - 1);
    Some(TileRange {
        z,
        min_x: col(extent.min_x),
        max_x: col(extent.max_x),
        min_y: row(extent.max_y),
        max_y: row(extent.min_y),
    })
}

/// Projected bounds of one tile.
pub fn tile_extent(tile: TileCoord) -> Extent {
    let tile_span = 2.0 * HALF_WORLD / tiles_per_side(tile.z) as f64;
    let min_x = -HALF_WORLD + tile.x as f64 * tile_span;
    let max_y = HALF_WORLD - tile.y as f64 * tile_span;
    Extent::new(min_x, max_y - tile_span, min_x + tile_span, max_y)
}

/// Fill `{z}`, `{x}`, `{y}` and `{s}` placeholders of a tile URL template.
pub fn tile_url(template: &str, tile: TileCoord) -> String {
    let subdomain = SUBDOMAINS[((tile.x + tile.y) % SUBDOMAINS.len() as u32) as usize];
    template
        .replace("{z}", &tile.z.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
        .replace("{s}", subdomain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::from_lon_lat;
    use crate::view::resolution_for_zoom;

    #[test]
    fn zoom_zero_is_one_tile() {
        let world = Extent::new(-HALF_WORLD, -HALF_WORLD, HALF_WORLD, HALF_WORLD);
        let range = tile_range(&world, 0).unwrap();
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![TileCoord::new(0, 0, 0)]);
        assert_eq!(tile_extent(TileCoord::new(0, 0, 0)), world);
    }

    #[test]
    fn lyon_tile_at_zoom_10() {
        // Slippy-map formula gives x=525, y=365 for 4.8552E 45.7774N at z10.
        let c = from_lon_lat(4.8552, 45.7774);
        let range = tile_range(&Extent::new(c.x, c.y, c.x, c.y), 10).unwrap();
        assert_eq!((range.min_x, range.min_y), (525, 365));
        assert_eq!(range.iter().count(), 1);
        assert!(tile_extent(TileCoord::new(10, 525, 365)).contains_coordinate(c));
    }

    #[test]
    fn range_is_clamped_to_grid() {
        let beyond = Extent::new(-2.0 * HALF_WORLD, -2.0 * HALF_WORLD, 0.0, 0.0);
        let range = tile_range(&beyond, 2).unwrap();
        assert_eq!((range.min_x, range.max_x, range.min_y, range.max_y), (0, 2, 2, 3));
        assert_eq!(range.iter().count(), 6);
    }

    #[test]
    fn extent_outside_world_has_no_tiles() {
        let outside = Extent::new(3.0 * HALF_WORLD, 0.0, 4.0 * HALF_WORLD, 1.0);
        assert_eq!(tile_range(&outside, 3), None);
    }

    #[test]
    fn tile_zoom_tracks_resolution() {
        assert_eq!(tile_zoom_for_resolution(resolution_for_zoom(6.0), 19), 6);
        assert_eq!(tile_zoom_for_resolution(resolution_for_zoom(6.4), 19), 6);
        assert_eq!(tile_zoom_for_resolution(resolution_for_zoom(6.6), 19), 7);
        assert_eq!(tile_zoom_for_resolution(resolution_for_zoom(21.0), 19), 19);
        assert_eq!(tile_zoom_for_resolution(MAX_RESOLUTION * 4.0, 19), 0);
    }

    #[test]
    fn url_template_substitution() {
        let tile = TileCoord::new(6, 33, 22);
        assert_eq!(
            tile_url(DEFAULT_TILE_URL, tile),
            "https://tile.openstreetmap.org/6/33/22.png"
        );
        assert_eq!(
            tile_url("https://{s}.tile.example/{z}/{x}/{y}.png", tile),
            "https://b.tile.example/6/33/22.png"
        );
    }
}
