use crate::projection::Coordinate;

/// Popup overlay state, toggled by single clicks on markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopupState {
    visible: bool,
    anchor: Option<Coordinate>,
    content: Option<String>,
    previous_label: Option<String>,
}

/// What a click did to the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupChange {
    Shown(String),
    Hidden,
}

impl PopupState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn opacity(&self) -> f64 {
        if self.visible { 1.0 } else { 0.0 }
    }

    /// Map coordinate the popup was last anchored at. Kept while hidden.
    pub fn anchor(&self) -> Option<Coordinate> {
        self.anchor
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn previous_label(&self) -> Option<&str> {
        self.previous_label.as_deref()
    }

    /// Apply a single click. `label` is the topmost marker under the click, if any.
    ///
    /// A label different from the previous one shows the popup at `at`. Anything else hides
    /// it and flips the remembered label: cleared when it equals `label`, otherwise replaced
    /// by `label` (which may be `None`).
    pub fn handle_click(&mut self, label: Option<&str>, at: Coordinate) -> PopupChange {
        match label {
            Some(label) if self.previous_label.as_deref() != Some(label) => {
                self.visible = true;
                self.anchor = Some(at);
                self.content = Some(label.to_string());
                self.previous_label = Some(label.to_string());
                PopupChange::Shown(label.to_string())
            }
            _ => {
                self.visible = false;
                self.previous_label = if self.previous_label.as_deref() == label {
                    None
                } else {
                    label.map(str::to_string)
                };
                PopupChange::Hidden
            }
        }
    }
}
