mod app;
mod canvas;
mod config;
mod error;
mod icons;
mod overlay;
mod render_loop;
mod tiles;

use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;

use crate::app::App;
use crate::config::MapConfig;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }

    let config = MapConfig::load();
    log::set_max_level(config.log_level().to_level_filter());

    let (host, setup) = match app::prepare(config) {
        Ok(prepared) => prepared,
        Err(err) => {
            log::error!("Map not started: {err}");
            return;
        }
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // If main() is re-entered (e.g. dev/hot-reload runtime quirks), drop the old mount
        // so stale handlers can't keep mutating map state.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(host, move || view! { <App setup=setup /> });
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
