use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, DomRect, HtmlCanvasElement, HtmlImageElement, MouseEvent,
    PointerEvent, WheelEvent,
};

use pinmap_shared::tile_grid::{tile_extent, tile_range, tile_zoom_for_resolution};
use pinmap_shared::{Coordinate, Cursor, MapView, PopupChange, TileCoord};

use crate::app::MapSetup;
use crate::icons::IconPainter;
use crate::render_loop::RenderScheduler;
use crate::tiles::{TileCache, TileLoader};

const BACKGROUND: &str = "#e8e4d8";
/// Pointer travel (px) under which a press/release counts as a click, not a drag.
const CLICK_SLOP_PX: f64 = 5.0;
/// Overdraw in pixels that hides hairline seams between adjacent tiles.
const TILE_SEAM_PX: f64 = 0.5;

struct ResizeBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

fn bind_resize(on_resize: impl Fn() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let handler = Closure::<dyn Fn()>::new(on_resize);
    if window
        .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
        .is_err()
    {
        return;
    }
    RESIZE_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().replace(ResizeBinding { window, handler }) {
            let _ = old
                .window
                .remove_event_listener_with_callback("resize", old.handler.as_ref().unchecked_ref());
        }
    });
}

fn unbind_resize() {
    RESIZE_BINDING.with(|slot| {
        if let Some(binding) = slot.borrow_mut().take() {
            let _ = binding
                .window
                .remove_event_listener_with_callback("resize", binding.handler.as_ref().unchecked_ref());
        }
    });
}

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// Pointer position relative to the canvas' top-left corner in CSS pixels.
fn local_pixel(canvas_rect: Option<DomRect>, e: &MouseEvent) -> (f64, f64) {
    canvas_rect
        .map(|rect| {
            (
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        })
        .unwrap_or((e.offset_x() as f64, e.offset_y() as f64))
}

fn canvas_rect(canvas_ref: NodeRef<leptos::html::Canvas>) -> Option<DomRect> {
    canvas_ref
        .get_untracked()
        .map(|el| el.get_bounding_client_rect())
}

fn to_pixel_rect(view: &MapView, size: (f64, f64), tile: TileCoord) -> (f64, f64, f64, f64) {
    let extent = tile_extent(tile);
    let (x0, y0) = view.coordinate_to_pixel(Coordinate::new(extent.min_x, extent.max_y), size);
    let (x1, y1) = view.coordinate_to_pixel(Coordinate::new(extent.max_x, extent.min_y), size);
    (x0, y0, x1 - x0, y1 - y0)
}

fn draw_tiles(
    ctx: &CanvasRenderingContext2d,
    view: &MapView,
    size: (f64, f64),
    max_zoom: u8,
    loader: &TileLoader,
    cache: &RefCell<TileCache<HtmlImageElement>>,
) {
    let z = tile_zoom_for_resolution(view.resolution, max_zoom);
    let Some(range) = tile_range(&view.visible_extent(size), z) else {
        return;
    };
    loader.request(&range);

    let cache = cache.borrow();
    for tile in range.iter() {
        let (x, y, w, h) = to_pixel_rect(view, size, tile);
        let (dw, dh) = (w + TILE_SEAM_PX, h + TILE_SEAM_PX);
        if let Some(image) = cache.get(tile) {
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, dw, dh);
        } else if let Some((ancestor, image)) = cache.loaded_ancestor(tile) {
            // Upscale the matching quarter (or smaller) of the parent tile.
            let depth = tile.z - ancestor.z;
            let cells = 1u32 << depth;
            let cell = image.natural_width() as f64 / cells as f64;
            let sx = (tile.x % cells) as f64 * cell;
            let sy = (tile.y % cells) as f64 * cell;
            let _ = ctx
                .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    image, sx, sy, cell, cell, x, y, dw, dh,
                );
        }
    }
}

/// Single-canvas map: raster tiles underneath, marker icons on top, popup as a DOM overlay.
#[component]
pub fn MapCanvas(setup: MapSetup) -> impl IntoView {
    let MapSetup {
        config,
        composer,
        overlay,
    } = setup;
    let composer = Rc::new(RefCell::new(composer));
    let overlay = Rc::new(overlay);
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Filled once the scheduler exists; tile and icon loads repaint through it.
    let repaint_slot: Rc<RefCell<Weak<RenderScheduler>>> = Rc::new(RefCell::new(Weak::new()));
    let request_repaint: Rc<dyn Fn()> = {
        let slot = repaint_slot.clone();
        Rc::new(move || {
            if let Some(scheduler) = slot.borrow().upgrade() {
                scheduler.mark_dirty();
            }
        })
    };

    let tile_cache = Rc::new(RefCell::new(TileCache::new(config.tile_concurrency)));
    let loader = TileLoader::new(tile_cache.clone(), &config.tile_url, {
        let request_repaint = request_repaint.clone();
        move || request_repaint()
    });

    let painter = {
        let markers = composer.borrow();
        match IconPainter::new(config.icon_mode, markers.markers(), request_repaint.clone()) {
            Ok(painter) => Some(painter),
            Err(err) => {
                log::error!("Marker icons unavailable: {err:?}");
                None
            }
        }
    };

    let initialized = Rc::new(Cell::new(false));
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));
    let max_zoom = config.max_zoom;

    let scheduler = RenderScheduler::new({
        let composer = composer.clone();
        let overlay = overlay.clone();
        let initialized = initialized.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let canvas: &HtmlCanvasElement = &canvas;
            let Some(parent) = canvas.parent_element() else {
                return;
            };
            let size = (parent.client_width() as f64, parent.client_height() as f64);
            if size.0 <= 0.0 || size.1 <= 0.0 {
                return;
            }

            let dpr = device_pixel_ratio();
            let bw = (size.0 * dpr).round() as u32;
            let bh = (size.1 * dpr).round() as u32;
            if canvas.width() != bw || canvas.height() != bh {
                canvas.set_width(bw);
                canvas.set_height(bh);
                // Canvas resize resets 2D context state
                *cached_ctx.borrow_mut() = None;
            }

            let mut comp = composer.borrow_mut();
            if initialized.replace(true) {
                comp.resize(size);
            } else {
                comp.initialize(size);
                log::info!(
                    "Map view fitted to {} markers at zoom {:.2}",
                    comp.markers().len(),
                    comp.view().zoom()
                );
            }

            if cached_ctx.borrow().is_none() {
                let ctx = canvas
                    .get_context("2d")
                    .ok()
                    .flatten()
                    .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok());
                if ctx.is_none() {
                    log::warn!("2D canvas context unavailable; map not drawn");
                    return;
                }
                *cached_ctx.borrow_mut() = ctx;
            }
            let ctx_ref = cached_ctx.borrow();
            let Some(ctx) = ctx_ref.as_ref() else {
                return;
            };

            let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
            ctx.set_fill_style_str(BACKGROUND);
            ctx.fill_rect(0.0, 0.0, size.0, size.1);

            let view = comp.view().clone();
            draw_tiles(ctx, &view, size, max_zoom, &loader, &tile_cache);

            if let Some(painter) = painter.as_ref() {
                for marker in comp.markers() {
                    let at = view.coordinate_to_pixel(marker.position, size);
                    painter.draw(ctx, &marker.icon, at);
                }
            }

            overlay.sync(comp.popup(), comp.popup_pixel());
        }
    });
    let scheduler = Rc::new(scheduler);
    *repaint_slot.borrow_mut() = Rc::downgrade(&scheduler);

    // First paint once the canvas is in the DOM.
    let sched_mount = scheduler.clone();
    Effect::new(move || {
        if canvas_ref.get().is_some() {
            sched_mount.mark_dirty();
        }
    });

    let sched_resize = scheduler.clone();
    bind_resize(move || sched_resize.mark_dirty());
    on_cleanup(unbind_resize);

    // --- Input handlers ---

    let is_dragging = Rc::new(Cell::new(false));
    let drag_start = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let last_pos = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let cursor = Rc::new(Cell::new(Cursor::Default));

    let on_wheel = {
        let composer = composer.clone();
        let scheduler = scheduler.clone();
        move |e: WheelEvent| {
            e.prevent_default();
            let px = local_pixel(canvas_rect(canvas_ref), &e);
            let mut comp = composer.borrow_mut();
            let size = comp.size();
            comp.view_mut().zoom_at(e.delta_y(), px, size);
            scheduler.mark_dirty();
        }
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            let pos = (e.client_x() as f64, e.client_y() as f64);
            drag_start.set(pos);
            last_pos.set(pos);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
            }
        }
    };

    let on_pointer_move = {
        let composer = composer.clone();
        let scheduler = scheduler.clone();
        let is_dragging = is_dragging.clone();
        let last_pos = last_pos.clone();
        let cursor = cursor.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let pos = (e.client_x() as f64, e.client_y() as f64);
                let (lx, ly) = last_pos.replace(pos);
                composer.borrow_mut().view_mut().pan(pos.0 - lx, pos.1 - ly);
                scheduler.mark_dirty();
                return;
            }
            let px = local_pixel(canvas_rect(canvas_ref), &e);
            let next = composer.borrow().on_pointer_move(px);
            if cursor.replace(next) != next
                && let Some(canvas) = canvas_ref.get_untracked()
            {
                let style = web_sys::HtmlElement::style(&canvas);
                let _ = match next {
                    Cursor::Pointer => style.set_property("cursor", next.css()),
                    Cursor::Default => style.remove_property("cursor").map(|_| ()),
                };
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |_: PointerEvent| {
            is_dragging.set(false);
        }
    };

    let on_click = {
        let composer = composer.clone();
        let overlay = overlay.clone();
        let drag_start = drag_start.clone();
        move |e: MouseEvent| {
            let (sx, sy) = drag_start.get();
            let dx = (e.client_x() as f64 - sx).abs();
            let dy = (e.client_y() as f64 - sy).abs();
            if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
                return;
            }
            let px = local_pixel(canvas_rect(canvas_ref), &e);
            let mut comp = composer.borrow_mut();
            match comp.on_single_click(px) {
                PopupChange::Shown(label) => log::debug!("Popup shown for {label}"),
                PopupChange::Hidden => log::debug!("Popup hidden"),
            }
            overlay.sync(comp.popup(), comp.popup_pixel());
        }
    };

    let on_pointer_leave = {
        let cursor = cursor.clone();
        move |_: PointerEvent| {
            if cursor.replace(Cursor::Default) != Cursor::Default
                && let Some(canvas) = canvas_ref.get_untracked()
            {
                web_sys::HtmlElement::style(&canvas).remove_property("cursor").ok();
            }
        }
    };

    view! {
        <div
            style="position: absolute; inset: 0; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none;"
            />
        </div>
    }
}
