use gloo_storage::Storage;
use gloo_storage::errors::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pinmap_shared::ViewOptions;
use pinmap_shared::tile_grid::DEFAULT_TILE_URL;

pub(crate) const STORAGE_KEY: &str = "pinmap.config";
/// Id of an optional `<script type="application/json">` element carrying page-level config.
pub(crate) const CONFIG_ELEMENT_ID: &str = "pinmap-config";
/// Hard upper bound of the tile grid zoom.
const MAX_TILE_ZOOM: u8 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum IconMode {
    /// Draw icons with canvas path primitives.
    Native,
    /// Draw icons from their SVG data URI.
    Svg,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MapConfig {
    pub tile_url: String,
    pub attribution: String,
    pub initial_center: [f64; 2],
    pub initial_zoom: f64,
    pub max_zoom: u8,
    pub fit_padding_px: f64,
    pub tile_concurrency: usize,
    pub icon_mode: IconMode,
    pub icon_scale: f64,
    pub log_level: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        let view = ViewOptions::default();
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: "\u{a9} OpenStreetMap contributors".to_string(),
            initial_center: view.initial_center,
            initial_zoom: view.initial_zoom,
            max_zoom: MAX_TILE_ZOOM,
            fit_padding_px: view.fit_padding,
            tile_concurrency: 6,
            icon_mode: IconMode::Native,
            icon_scale: view.icon_scale,
            log_level: "info".to_string(),
        }
    }
}

impl MapConfig {
    pub(crate) fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str::<Self>(raw)?.sanitized())
    }

    /// Page config first, then the localStorage fallback, then defaults.
    pub(crate) fn load() -> Self {
        if let Some(raw) = page_config_text() {
            match Self::from_json(&raw) {
                Ok(config) => return config,
                Err(err) => log::warn!("Ignoring #{CONFIG_ELEMENT_ID}: {err}"),
            }
        }
        Self::from_stored(gloo_storage::LocalStorage::get::<Self>(STORAGE_KEY))
    }

    /// Resolve a localStorage read. A missing key is silent; anything else unreadable is
    /// logged and replaced by defaults.
    fn from_stored(stored: Result<Self, StorageError>) -> Self {
        match stored {
            Ok(config) => config.sanitized(),
            Err(StorageError::KeyNotFound(_)) => Self::default(),
            Err(err) => {
                log::warn!("Ignoring stored {STORAGE_KEY}: {err}");
                Self::default()
            }
        }
    }

    /// Replace out-of-range values with their defaults.
    pub(crate) fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.tile_url.trim().is_empty() {
            self.tile_url = defaults.tile_url;
        }
        let [lon, lat] = self.initial_center;
        if !(lon.is_finite() && lat.is_finite()) {
            self.initial_center = defaults.initial_center;
        }
        if !self.initial_zoom.is_finite() {
            self.initial_zoom = defaults.initial_zoom;
        }
        self.max_zoom = self.max_zoom.min(MAX_TILE_ZOOM);
        if !self.fit_padding_px.is_finite() || self.fit_padding_px < 0.0 {
            self.fit_padding_px = defaults.fit_padding_px;
        }
        if self.tile_concurrency == 0 {
            self.tile_concurrency = defaults.tile_concurrency;
        }
        if !self.icon_scale.is_finite() || self.icon_scale <= 0.0 {
            self.icon_scale = defaults.icon_scale;
        }
        self
    }

    pub(crate) fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    pub(crate) fn view_options(&self) -> ViewOptions {
        ViewOptions {
            initial_center: self.initial_center,
            initial_zoom: self.initial_zoom,
            max_zoom: f64::from(self.max_zoom),
            fit_padding: self.fit_padding_px,
            icon_scale: self.icon_scale,
        }
    }
}

fn page_config_text() -> Option<String> {
    web_sys::window()?
        .document()?
        .get_element_by_id(CONFIG_ELEMENT_ID)?
        .text_content()
        .filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = MapConfig::from_json("{}").unwrap();
        assert_eq!(config, MapConfig::default());
        assert_eq!(config.initial_center, [4.8552, 45.7774]);
        assert_eq!(config.initial_zoom, 6.0);
        assert_eq!(config.icon_mode, IconMode::Native);
        assert_eq!(config.tile_url, "https://tile.openstreetmap.org/{z}/{x}/{y}.png");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            MapConfig::from_json(r#"{"icon_mode":"svg","initial_zoom":4.5,"log_level":"debug"}"#)
                .unwrap();
        assert_eq!(config.icon_mode, IconMode::Svg);
        assert_eq!(config.initial_zoom, 4.5);
        assert_eq!(config.log_level(), log::Level::Debug);
        assert_eq!(config.tile_concurrency, 6);
    }

    #[test]
    fn out_of_range_values_are_reset() {
        let config = MapConfig::from_json(
            r#"{"max_zoom":30,"tile_concurrency":0,"icon_scale":-2,"fit_padding_px":-1,"tile_url":" "}"#,
        )
        .unwrap();
        let defaults = MapConfig::default();
        assert_eq!(config.max_zoom, 19);
        assert_eq!(config.tile_concurrency, defaults.tile_concurrency);
        assert_eq!(config.icon_scale, defaults.icon_scale);
        assert_eq!(config.fit_padding_px, defaults.fit_padding_px);
        assert_eq!(config.tile_url, defaults.tile_url);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = MapConfig::from_json("{not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid config JSON"));
    }

    #[test]
    fn stored_config_is_sanitized() {
        let stored = MapConfig {
            tile_concurrency: 0,
            initial_zoom: 3.0,
            ..MapConfig::default()
        };
        let config = MapConfig::from_stored(Ok(stored));
        assert_eq!(config.tile_concurrency, 6);
        assert_eq!(config.initial_zoom, 3.0);
    }

    #[test]
    fn missing_or_corrupt_storage_gives_defaults() {
        let missing = MapConfig::from_stored(Err(StorageError::KeyNotFound(STORAGE_KEY.into())));
        assert_eq!(missing, MapConfig::default());

        let corrupt = serde_json::from_str::<MapConfig>("{broken").unwrap_err();
        let config = MapConfig::from_stored(Err(StorageError::SerdeError(corrupt)));
        assert_eq!(config, MapConfig::default());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = MapConfig {
            log_level: "chatty".into(),
            ..MapConfig::default()
        };
        assert_eq!(config.log_level(), log::Level::Info);
    }

    #[test]
    fn view_options_mirror_config() {
        let config = MapConfig {
            max_zoom: 12,
            icon_scale: 1.25,
            ..MapConfig::default()
        };
        let options = config.view_options();
        assert_eq!(options.max_zoom, 12.0);
        assert_eq!(options.icon_scale, 1.25);
        assert_eq!(options.fit_padding, 48.0);
    }
}
