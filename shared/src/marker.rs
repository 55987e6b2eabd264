use crate::extent::Extent;
use crate::icon::IconDescriptor;
use crate::location::{Category, LocationEntry};
use crate::projection::{Coordinate, from_lon_lat};
use crate::view::MapView;

/// A drawable point feature derived from one [`LocationEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub label: &'static str,
    pub lon_lat: [f64; 2],
    pub position: Coordinate,
    pub category: Category,
    pub icon: IconDescriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Pointer,
}

impl Cursor {
    /// Value for the CSS `cursor` property; empty clears any inline style.
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

pub fn build_marker(entry: &LocationEntry) -> Marker {
    Marker {
        label: entry.name,
        lon_lat: [entry.longitude, entry.latitude],
        position: from_lon_lat(entry.longitude, entry.latitude),
        category: entry.category,
        icon: IconDescriptor::for_category(entry.category),
    }
}

/// One marker per entry, in registry order.
pub fn build_markers(entries: &[LocationEntry]) -> Vec<Marker> {
    entries.iter().map(build_marker).collect()
}

pub fn markers_extent(markers: &[Marker]) -> Option<Extent> {
    Extent::from_coordinates(markers.iter().map(|m| m.position))
}

/// Topmost marker whose icon covers `px`. Later markers are drawn over earlier ones.
pub fn marker_at_pixel<'a>(
    markers: &'a [Marker],
    view: &MapView,
    size: (f64, f64),
    px: (f64, f64),
) -> Option<&'a Marker> {
    markers.iter().rev().find(|m| {
        let at = view.coordinate_to_pixel(m.position, size);
        m.icon.contains_pixel(at, px)
    })
}

pub fn cursor_for_pixel(
    markers: &[Marker],
    view: &MapView,
    size: (f64, f64),
    px: (f64, f64),
) -> Cursor {
    if marker_at_pixel(markers, view, size, px).is_some() {
        Cursor::Pointer
    } else {
        Cursor::Default
    }
}
