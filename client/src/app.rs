use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use pinmap_shared::{Category, MapComposer, locations};

use crate::canvas::MapCanvas;
use crate::config::MapConfig;
use crate::error::StartupError;
use crate::overlay::PopupOverlay;

pub(crate) const MAP_ID: &str = "map";

/// Everything the map component needs, built and checked before anything is mounted.
pub(crate) struct MapSetup {
    pub config: MapConfig,
    pub composer: MapComposer,
    pub overlay: PopupOverlay,
}

/// Resolve the DOM mount points and the location registry, failing on the first problem.
pub(crate) fn prepare(config: MapConfig) -> Result<(HtmlElement, MapSetup), StartupError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or(StartupError::NoDocument)?;
    let host = document
        .get_element_by_id(MAP_ID)
        .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        .ok_or(StartupError::MissingElement(MAP_ID))?;

    let composer = MapComposer::new(locations(), config.view_options())?;
    log::info!("Loaded {} map markers", composer.markers().len());

    host.style().set_property("position", "relative").ok();
    host.style().set_property("overflow", "hidden").ok();
    let overlay = PopupOverlay::adopt(&document, &host)?;

    Ok((
        host,
        MapSetup {
            config,
            composer,
            overlay,
        },
    ))
}

/// Swatch color and text for each marker category, in drawing order.
fn legend_entries() -> Vec<(&'static str, &'static str)> {
    Category::ALL
        .iter()
        .map(|category| (category.color(), category.label()))
        .collect()
}

#[component]
pub fn App(setup: MapSetup) -> impl IntoView {
    let attribution = setup.config.attribution.clone();

    view! {
        <div style="position: absolute; inset: 0;">
            <MapCanvas setup=setup />
            <div
                class="map-legend"
                style="position: absolute; left: 8px; bottom: 8px; padding: 4px 8px; font: 12px sans-serif; color: #333; background: rgba(255,255,255,0.85); border-radius: 4px; pointer-events: none;"
            >
                {legend_entries()
                    .into_iter()
                    .map(|(color, label)| {
                        view! {
                            <div style="display: flex; align-items: center; gap: 6px;">
                                <span style=format!(
                                    "display: inline-block; width: 10px; height: 10px; border-radius: 50%; background: {color};",
                                )></span>
                                {label}
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
            <div
                class="map-attribution"
                style="position: absolute; right: 0; bottom: 0; padding: 1px 6px; font: 11px sans-serif; color: #333; background: rgba(255,255,255,0.75); pointer-events: none;"
            >
                {attribution}
            </div>
        </div>
    }
}
