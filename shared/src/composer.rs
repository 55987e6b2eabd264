use crate::extent::Extent;
use crate::location::{LocationEntry, RegistryError, validate_registry};
use crate::marker::{Cursor, Marker, build_markers, cursor_for_pixel, marker_at_pixel, markers_extent};
use crate::popup::{PopupChange, PopupState};
use crate::view::{DEFAULT_MAX_ZOOM, MapView};

/// Initial view parameters for [`MapComposer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub initial_center: [f64; 2],
    pub initial_zoom: f64,
    pub max_zoom: f64,
    /// Pixels kept free around the markers when fitting the view.
    pub fit_padding: f64,
    pub icon_scale: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            initial_center: [4.8552, 45.7774],
            initial_zoom: 6.0,
            max_zoom: DEFAULT_MAX_ZOOM,
            fit_padding: 48.0,
            icon_scale: 1.0,
        }
    }
}

/// Owns the markers, the view and the popup state, and answers the two interaction events.
#[derive(Debug, Clone)]
pub struct MapComposer {
    markers: Vec<Marker>,
    extent: Option<Extent>,
    view: MapView,
    size: (f64, f64),
    popup: PopupState,
    options: ViewOptions,
}

impl MapComposer {
    pub fn new(entries: &[LocationEntry], options: ViewOptions) -> Result<Self, RegistryError> {
        validate_registry(entries)?;
        let markers: Vec<Marker> = build_markers(entries)
            .into_iter()
            .map(|mut marker| {
                marker.icon = marker.icon.with_scale(options.icon_scale);
                marker
            })
            .collect();
        let extent = markers_extent(&markers);
        Ok(Self {
            markers,
            extent,
            view: MapView::new(options.initial_center, options.initial_zoom, options.max_zoom),
            size: (0.0, 0.0),
            popup: PopupState::new(),
            options,
        })
    }

    /// Set the initial center/zoom, then fit the view to all markers for a `size` viewport.
    pub fn initialize(&mut self, size: (f64, f64)) {
        self.size = size;
        self.view = MapView::new(
            self.options.initial_center,
            self.options.initial_zoom,
            self.options.max_zoom,
        );
        if let Some(extent) = self.extent {
            self.view.fit(&extent, size, self.options.fit_padding);
        }
    }

    /// Track a viewport resize, keeping the current center and resolution.
    pub fn resize(&mut self, size: (f64, f64)) {
        self.size = size;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut MapView {
        &mut self.view
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn label_at(&self, px: (f64, f64)) -> Option<&'static str> {
        marker_at_pixel(&self.markers, &self.view, self.size, px).map(|m| m.label)
    }

    pub fn on_pointer_move(&self, px: (f64, f64)) -> Cursor {
        cursor_for_pixel(&self.markers, &self.view, self.size, px)
    }

    pub fn on_single_click(&mut self, px: (f64, f64)) -> PopupChange {
        let label = self.label_at(px);
        let at = self.view.pixel_to_coordinate(px, self.size);
        self.popup.handle_click(label, at)
    }

    /// Pixel the popup should be pinned to for the current view, if it is visible.
    pub fn popup_pixel(&self) -> Option<(f64, f64)> {
        if !self.popup.is_visible() {
            return None;
        }
        self.popup
            .anchor()
            .map(|c| self.view.coordinate_to_pixel(c, self.size))
    }
}
