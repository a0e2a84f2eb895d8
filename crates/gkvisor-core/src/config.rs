//! Widget configuration and per-variant constants.

use kurbo::Point;
use peniko::Color;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default side length of the drawing surface, in pixels.
pub const DEFAULT_SIZE: f64 = 60.0;

/// Default title of the helper's tutorial panel.
pub const DEFAULT_TITLE: &str = "Gestures";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Options must be a JSON object")]
    NotAnObject,
    #[error("Option `size` must be a positive finite number, got {0}")]
    InvalidSize(f64),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The two flavors of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Minimal trail display.
    #[default]
    Visor,
    /// Trail display that also marks touch starts and opens a tutorial panel on tap.
    Helper,
}

impl Variant {
    /// Where the widget sits before the first drag.
    pub fn initial_offset(self) -> Point {
        match self {
            Variant::Visor => Point::new(2.0, 2.0),
            Variant::Helper => Point::new(2.0, 60.0),
        }
    }

    /// Plain fill shown behind strokes.
    pub fn background(self) -> Color {
        match self {
            Variant::Visor => Color::from_rgba8(0x90, 0x90, 0x90, 0xff),
            Variant::Helper => Color::from_rgba8(0x99, 0x99, 0x99, 0xff),
        }
    }

    /// Image shown while no gesture is being drawn.
    pub fn idle_image(self) -> &'static str {
        match self {
            Variant::Visor => "visor/assets/gk.png",
            Variant::Helper => "https://i.cloudup.com/jAmu8s95gF-3000x3000.png",
        }
    }

    /// CSS class given to the surface element.
    pub fn class_name(self) -> Option<&'static str> {
        match self {
            Variant::Visor => None,
            Variant::Helper => Some("gk-helper-display"),
        }
    }

    /// Whether the surface is pinned to `top: 0; left: 0` under its transform.
    pub fn anchors_top_left(self) -> bool {
        matches!(self, Variant::Helper)
    }

    /// Container used when the options name none.
    pub fn default_container(self) -> Container {
        match self {
            Variant::Visor => Container::DocumentElement,
            Variant::Helper => Container::Body,
        }
    }

    /// Whether the first sample of a contact is drawn as a dot.
    pub fn marks_touch_start(self) -> bool {
        matches!(self, Variant::Helper)
    }

    pub fn has_tutorial(self) -> bool {
        matches!(self, Variant::Helper)
    }
}

/// Element the surface is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    DocumentElement,
    Body,
    /// First element matching a CSS selector.
    Selector(String),
}

/// The option bag accepted at construction, as supplied by the caller.
///
/// Every field is optional; [`WidgetConfig::resolve`] fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WidgetOptions {
    pub size: Option<f64>,
    pub container: Option<String>,
    pub drag: Option<bool>,
    pub snap: Option<bool>,
    pub title: Option<String>,
    /// Keys present in the input that are not recognized.
    #[serde(flatten)]
    pub ignored: BTreeMap<String, Value>,
}

impl WidgetOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parse options from a JSON value. `null` means no options.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        if !value.is_object() {
            return Err(ConfigError::NotAnObject);
        }

        let options = Self::deserialize(value)?;
        if let Some(size) = options.size.filter(|size| !(size.is_finite() && *size > 0.0)) {
            return Err(ConfigError::InvalidSize(size));
        }
        for key in options.ignored.keys() {
            log::warn!("Ignoring unknown widget option `{}`", key);
        }
        Ok(options)
    }

    /// Names of the unrecognized keys, sorted.
    pub fn ignored_keys(&self) -> impl Iterator<Item = &str> {
        self.ignored.keys().map(String::as_str)
    }
}

/// Fully resolved widget configuration. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub size: f64,
    pub container: Container,
    pub drag: bool,
    pub snap: bool,
    pub title: String,
}

impl WidgetConfig {
    /// Merge supplied options over the defaults of `variant`.
    pub fn resolve(options: WidgetOptions, variant: Variant) -> Self {
        Self {
            size: options.size.unwrap_or(DEFAULT_SIZE),
            container: options
                .container
                .map(Container::Selector)
                .unwrap_or_else(|| variant.default_container()),
            drag: options.drag.unwrap_or(true),
            snap: options.snap.unwrap_or(true),
            title: options.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        }
    }

    /// Defaults for `variant` with no options supplied.
    pub fn for_variant(variant: Variant) -> Self {
        Self::resolve(WidgetOptions::default(), variant)
    }
}
