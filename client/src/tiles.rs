#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use pinmap_shared::TileCoord;
use pinmap_shared::tile_grid::{TileRange, tile_url};

const MAX_CACHED_TILES: usize = 384;
/// How many zoom levels up to search for a stand-in while a tile loads.
const MAX_ANCESTOR_DEPTH: u8 = 4;
const ONLOAD_HANDLE_KEY: &str = "__pinmapTileOnload";
const ONERROR_HANDLE_KEY: &str = "__pinmapTileOnerror";

static TILE_ERROR_WARNED: AtomicBool = AtomicBool::new(false);

enum TileSlot<I> {
    Pending,
    Loaded(I),
    Failed,
}

/// Tile bookkeeping: which tiles are wanted, queued, in flight, loaded or failed.
/// Generic over the image handle so it works without a browser.
pub(crate) struct TileCache<I> {
    slots: HashMap<TileCoord, TileSlot<I>>,
    queue: VecDeque<TileCoord>,
    in_flight: HashSet<TileCoord>,
    wanted: HashSet<TileCoord>,
    max_concurrency: usize,
}

impl<I> TileCache<I> {
    pub(crate) fn new(max_concurrency: usize) -> Self {
        Self {
            slots: HashMap::new(),
            queue: VecDeque::new(),
            in_flight: HashSet::new(),
            wanted: HashSet::new(),
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Make `range` the wanted set. Missing tiles are queued center-first; queued tiles
    /// that left the view are dropped before they start loading.
    pub(crate) fn request(&mut self, range: &TileRange) {
        self.wanted = range.iter().collect();

        let stale: Vec<TileCoord> = self
            .queue
            .iter()
            .copied()
            .filter(|coord| !self.wanted.contains(coord))
            .collect();
        self.queue.retain(|coord| self.wanted.contains(coord));
        for coord in stale {
            self.slots.remove(&coord);
        }

        let center_x = (range.min_x as f64 + range.max_x as f64) / 2.0;
        let center_y = (range.min_y as f64 + range.max_y as f64) / 2.0;
        let mut missing: Vec<TileCoord> = range
            .iter()
            .filter(|coord| !self.slots.contains_key(coord))
            .collect();
        missing.sort_by(|a, b| {
            let da = (a.x as f64 - center_x).powi(2) + (a.y as f64 - center_y).powi(2);
            let db = (b.x as f64 - center_x).powi(2) + (b.y as f64 - center_y).powi(2);
            da.total_cmp(&db).then_with(|| a.cmp(b))
        });
        for coord in missing {
            self.slots.insert(coord, TileSlot::Pending);
            self.queue.push_back(coord);
        }

        self.evict();
    }

    /// Next tile to start loading, if a concurrency slot is free.
    pub(crate) fn next_job(&mut self) -> Option<TileCoord> {
        if self.in_flight.len() >= self.max_concurrency {
            return None;
        }
        let coord = self.queue.pop_front()?;
        self.in_flight.insert(coord);
        Some(coord)
    }

    /// Record the outcome of a load started by [`TileCache::next_job`].
    pub(crate) fn finish(&mut self, coord: TileCoord, image: Option<I>) {
        self.in_flight.remove(&coord);
        let slot = match image {
            Some(image) => TileSlot::Loaded(image),
            None => TileSlot::Failed,
        };
        self.slots.insert(coord, slot);
    }

    pub(crate) fn get(&self, coord: TileCoord) -> Option<&I> {
        match self.slots.get(&coord) {
            Some(TileSlot::Loaded(image)) => Some(image),
            _ => None,
        }
    }

    /// Closest loaded ancestor of `coord`, used to fill the gap while it loads.
    pub(crate) fn loaded_ancestor(&self, coord: TileCoord) -> Option<(TileCoord, &I)> {
        let mut current = coord;
        for _ in 0..MAX_ANCESTOR_DEPTH {
            if current.z == 0 {
                return None;
            }
            current = TileCoord::new(current.z - 1, current.x / 2, current.y / 2);
            if let Some(image) = self.get(current) {
                return Some((current, image));
            }
        }
        None
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    fn evict(&mut self) {
        if self.slots.len() <= MAX_CACHED_TILES {
            return;
        }
        let wanted = &self.wanted;
        let in_flight = &self.in_flight;
        self.slots.retain(|coord, slot| {
            wanted.contains(coord) || in_flight.contains(coord) || matches!(slot, TileSlot::Pending)
        });
    }
}

fn warn_tile_error_once(src: &str) {
    if TILE_ERROR_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        log::warn!("Failed to load map tile {src}; further tile errors are not reported.");
    }
}

/// Loads tiles from the raster tile source into a shared [`TileCache`].
#[derive(Clone)]
pub(crate) struct TileLoader {
    cache: Rc<RefCell<TileCache<HtmlImageElement>>>,
    template: Rc<str>,
    on_loaded: Rc<dyn Fn()>,
}

impl TileLoader {
    pub(crate) fn new(
        cache: Rc<RefCell<TileCache<HtmlImageElement>>>,
        template: &str,
        on_loaded: impl Fn() + 'static,
    ) -> Self {
        Self {
            cache,
            template: Rc::from(template),
            on_loaded: Rc::new(on_loaded),
        }
    }

    /// Ask for the tiles of `range` and start as many loads as concurrency allows.
    pub(crate) fn request(&self, range: &TileRange) {
        self.cache.borrow_mut().request(range);
        self.pump();
    }

    fn pump(&self) {
        loop {
            let Some(coord) = self.cache.borrow_mut().next_job() else {
                break;
            };
            self.load(coord);
        }
    }

    fn load(&self, coord: TileCoord) {
        let src = tile_url(&self.template, coord);
        let img = match HtmlImageElement::new() {
            Ok(img) => img,
            Err(_) => {
                self.cache.borrow_mut().finish(coord, None);
                return;
            }
        };

        let img_for_load = img.clone();
        let loader_load = self.clone();
        let onload = Closure::<dyn FnMut()>::new(move || {
            clear_image_handlers(&img_for_load);
            {
                let mut cache = loader_load.cache.borrow_mut();
                cache.finish(coord, Some(img_for_load.clone()));
                if cache.is_idle() {
                    log::debug!("Tile queue idle with {} cached tiles", cache.len());
                }
            }
            (loader_load.on_loaded)();
            loader_load.pump();
        });

        let img_for_error = img.clone();
        let loader_error = self.clone();
        let src_for_error = src.clone();
        let onerror = Closure::<dyn FnMut()>::new(move || {
            clear_image_handlers(&img_for_error);
            warn_tile_error_once(&src_for_error);
            loader_error.cache.borrow_mut().finish(coord, None);
            loader_error.pump();
        });

        let onload_js = onload.into_js_value();
        let onerror_js = onerror.into_js_value();
        img.set_onload(Some(onload_js.unchecked_ref()));
        img.set_onerror(Some(onerror_js.unchecked_ref()));
        let _ = Reflect::set(
            img.as_ref(),
            &JsValue::from_str(ONLOAD_HANDLE_KEY),
            &onload_js,
        );
        let _ = Reflect::set(
            img.as_ref(),
            &JsValue::from_str(ONERROR_HANDLE_KEY),
            &onerror_js,
        );
        img.set_src(&src);
    }
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(z: u8, min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> TileRange {
        TileRange {
            z,
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[test]
    fn center_tiles_load_first() {
        let mut cache: TileCache<&str> = TileCache::new(1);
        cache.request(&range(3, 0, 0, 2, 2));
        assert_eq!(cache.next_job(), Some(TileCoord::new(3, 1, 1)));
        // Concurrency limit reached.
        assert_eq!(cache.next_job(), None);
    }

    #[test]
    fn finished_tiles_are_cached_once() {
        let mut cache: TileCache<&str> = TileCache::new(4);
        let r = range(2, 1, 1, 1, 1);
        cache.request(&r);
        let coord = cache.next_job().unwrap();
        cache.finish(coord, Some("img"));
        assert_eq!(cache.get(coord), Some(&"img"));
        assert!(cache.is_idle());

        cache.request(&r);
        assert_eq!(cache.next_job(), None);
    }

    #[test]
    fn failed_tiles_are_not_retried() {
        let mut cache: TileCache<&str> = TileCache::new(4);
        let r = range(2, 0, 0, 0, 0);
        cache.request(&r);
        let coord = cache.next_job().unwrap();
        cache.finish(coord, None);
        assert_eq!(cache.get(coord), None);
        cache.request(&r);
        assert_eq!(cache.next_job(), None);
    }

    #[test]
    fn stale_queued_tiles_are_dropped() {
        let mut cache: TileCache<&str> = TileCache::new(1);
        cache.request(&range(4, 0, 0, 3, 0));
        let started = cache.next_job().unwrap();
        cache.request(&range(4, 10, 10, 10, 10));
        cache.finish(started, Some("old"));
        assert_eq!(cache.next_job(), Some(TileCoord::new(4, 10, 10)));
        assert_eq!(cache.next_job(), None);
        // Only the started tile and the new one remain.
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn ancestor_stands_in_while_loading() {
        let mut cache: TileCache<&str> = TileCache::new(8);
        cache.request(&range(5, 8, 8, 8, 8));
        let parent = cache.next_job().unwrap();
        cache.finish(parent, Some("parent"));

        let child = TileCoord::new(7, 33, 34);
        assert_eq!(cache.loaded_ancestor(child), Some((parent, &"parent")));
        assert_eq!(cache.loaded_ancestor(TileCoord::new(0, 0, 0)), None);
        assert_eq!(cache.loaded_ancestor(TileCoord::new(12, 0, 0)), None);
    }
}
