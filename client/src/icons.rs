use std::collections::HashMap;
use std::f64::consts::TAU;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement, Path2d};

use pinmap_shared::icon::{CIRCLE, TEARDROP_PATH};
use pinmap_shared::{IconDescriptor, IconShape, Marker};

use crate::config::IconMode;

/// Rasterizes [`IconDescriptor`]s onto the map canvas.
///
/// Native mode draws the teardrop with canvas paths. SVG mode draws one image per distinct
/// descriptor from its data URI, and uses the native path until that image has decoded.
pub(crate) struct IconPainter {
    teardrop: Path2d,
    images: HashMap<String, HtmlImageElement>,
}

impl IconPainter {
    pub(crate) fn new(
        mode: IconMode,
        markers: &[Marker],
        on_ready: Rc<dyn Fn()>,
    ) -> Result<Self, JsValue> {
        let teardrop = Path2d::new_with_path_string(TEARDROP_PATH)?;
        let mut images = HashMap::new();
        if mode == IconMode::Svg {
            for marker in markers {
                let key = marker.icon.cache_key();
                if images.contains_key(&key) {
                    continue;
                }
                let image = HtmlImageElement::new()?;
                let on_ready = on_ready.clone();
                let onload = Closure::<dyn FnMut()>::new(move || on_ready()).into_js_value();
                image.set_onload(Some(onload.unchecked_ref()));
                image.set_src(&marker.icon.to_data_uri());
                images.insert(key, image);
            }
        }
        Ok(Self { teardrop, images })
    }

    /// Draw `icon` with its anchor on pixel `at`.
    pub(crate) fn draw(&self, ctx: &CanvasRenderingContext2d, icon: &IconDescriptor, at: (f64, f64)) {
        let (left, top, w, h) = icon.pixel_rect(at);
        if let Some(image) = self.images.get(&icon.cache_key())
            && image.complete()
            && image.natural_width() > 0
        {
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(image, left, top, w, h);
            return;
        }
        match icon.shape {
            IconShape::Teardrop => self.draw_teardrop(ctx, icon, left, top),
        }
    }

    fn draw_teardrop(&self, ctx: &CanvasRenderingContext2d, icon: &IconDescriptor, left: f64, top: f64) {
        ctx.save();
        let _ = ctx.translate(left, top);
        let _ = ctx.scale(icon.scale, icon.scale);
        ctx.set_fill_style_str(&icon.fill);
        ctx.fill_with_path_2d(&self.teardrop);
        ctx.set_stroke_style_str(&icon.stroke);
        ctx.set_line_width(1.0);
        ctx.stroke_with_path(&self.teardrop);

        let (cx, cy, r) = CIRCLE;
        ctx.begin_path();
        if ctx.arc(cx, cy, r, 0.0, TAU).is_ok() {
            ctx.set_fill_style_str(&icon.circle_fill);
            ctx.fill();
        }
        ctx.restore();
    }
}
