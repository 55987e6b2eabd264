use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use pinmap_shared::PopupState;

use crate::error::StartupError;

pub(crate) const POPUP_ID: &str = "popup";
pub(crate) const POPUP_CONTENT_ID: &str = "popup-content";
/// Lift the popup above the marker icon it points at.
const POPUP_OFFSET_Y: f64 = 40.0;

fn html_element(document: &Document, id: &'static str) -> Result<HtmlElement, StartupError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or(StartupError::MissingElement(id))
}

/// The page's `#popup` element, positioned over the map at a coordinate.
pub(crate) struct PopupOverlay {
    container: HtmlElement,
    content: HtmlElement,
}

impl PopupOverlay {
    /// Take over `#popup` / `#popup-content` and move the popup into the map host.
    pub(crate) fn adopt(document: &Document, host: &HtmlElement) -> Result<Self, StartupError> {
        let container = html_element(document, POPUP_ID)?;
        let content = html_element(document, POPUP_CONTENT_ID)?;
        if !container.contains(Some(&content)) {
            return Err(StartupError::MissingElement(POPUP_CONTENT_ID));
        }
        host.append_child(&container)
            .map_err(|_| StartupError::MissingElement(POPUP_ID))?;

        let style = container.style();
        style.set_property("position", "absolute").ok();
        style.set_property("z-index", "10").ok();
        style.set_property("transform", &format!("translate(-50%, calc(-100% - {POPUP_OFFSET_Y}px))")).ok();
        style.set_property("transition", "opacity 0.15s").ok();

        let overlay = Self { container, content };
        overlay.sync(&PopupState::new(), None);
        Ok(overlay)
    }

    /// Mirror `popup` into the DOM. `pixel` is where the anchor sits in the current view.
    pub(crate) fn sync(&self, popup: &PopupState, pixel: Option<(f64, f64)>) {
        let style = self.container.style();
        match (popup.is_visible(), pixel) {
            (true, Some((x, y))) => {
                self.content.set_text_content(popup.content());
                style.set_property("left", &format!("{x}px")).ok();
                style.set_property("top", &format!("{y}px")).ok();
                style.set_property("visibility", "visible").ok();
            }
            _ => {
                style.set_property("visibility", "hidden").ok();
            }
        }
        style
            .set_property("opacity", &popup.opacity().to_string())
            .ok();
    }
}
