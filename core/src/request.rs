//! The generation request as submitted by the caller, plus the payload
//! forwarded to HTTP workers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::JobError;

pub const DEFAULT_THEME: &str = "feature_based";
pub const DEFAULT_DISTANCE: i64 = 10_000;
pub const DEFAULT_FORMAT: &str = "png";
pub const SUPPORTED_FORMATS: [&str; 3] = ["png", "svg", "pdf"];

const DEFAULT_WIDTH_IN: f64 = 12.0;
const DEFAULT_HEIGHT_IN: f64 = 16.0;

/// Accepts both the browser's camelCase names and the worker's snake_case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub country: String,

    /// Search radius in metres.
    #[serde(default = "default_distance")]
    pub distance: i64,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default, alias = "name", alias = "nameLabel")]
    pub name_label: Option<String>,

    #[serde(default, alias = "countryLabel")]
    pub country_label: Option<String>,

    #[serde(default, alias = "style")]
    pub theme: Option<String>,

    #[serde(default, alias = "allThemes")]
    pub all_themes: bool,

    #[serde(default, alias = "customLayers")]
    pub custom_layers: Vec<CustomLayer>,

    #[serde(default, alias = "customColors")]
    pub custom_colors: Option<CustomColors>,

    #[serde(default)]
    pub dpi: Option<u32>,

    /// Inches.
    #[serde(default)]
    pub margins: Option<f64>,

    #[serde(default, alias = "paperSize")]
    pub paper_size: Option<String>,

    /// Inches.
    #[serde(default)]
    pub width: Option<f64>,

    /// Inches.
    #[serde(default)]
    pub height: Option<f64>,
}

fn default_distance() -> i64 {
    DEFAULT_DISTANCE
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomLayer {
    pub label: String,
    /// Feature-matching predicate, e.g. `{"amenity": "cafe"}`.
    #[serde(default)]
    pub tags: Map<String, Value>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomColors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roads: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CustomColors {
    pub fn is_empty(&self) -> bool {
        self == &CustomColors::default()
    }
}

impl GenerationRequest {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            distance: DEFAULT_DISTANCE,
            format: default_format(),
            name_label: None,
            country_label: None,
            theme: None,
            all_themes: false,
            custom_layers: Vec::new(),
            custom_colors: None,
            dpi: None,
            margins: None,
            paper_size: None,
            width: None,
            height: None,
        }
    }

    /// Checks everything that can be checked before any work starts.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.city.trim().is_empty() || self.country.trim().is_empty() {
            return Err(invalid("Missing mandatory fields (city, country)"));
        }
        let has_theme = self.theme.as_deref().is_some_and(|t| !t.trim().is_empty());
        if has_theme && self.all_themes {
            return Err(invalid("Choose either a theme or all themes, not both"));
        }
        if !SUPPORTED_FORMATS.contains(&self.format.as_str()) {
            return Err(invalid(format!(
                "Unsupported format '{}' (expected one of: {})",
                self.format,
                SUPPORTED_FORMATS.join(", ")
            )));
        }
        if self.distance <= 0 {
            return Err(invalid("Distance must be a positive number of metres"));
        }
        if self.dpi == Some(0) {
            return Err(invalid("DPI must be positive"));
        }
        for (name, value) in [("Width", self.width), ("Height", self.height)] {
            if value.is_some_and(|v| !(v.is_finite() && v > 0.0)) {
                return Err(invalid(format!("{name} must be positive")));
            }
        }
        if self.margins.is_some_and(|m| !(m.is_finite() && m >= 0.0)) {
            return Err(invalid("Margins must not be negative"));
        }
        if let Some(layer) = self.custom_layers.iter().find(|l| l.label.trim().is_empty()) {
            return Err(invalid(format!(
                "Custom layer with color '{}' has no label",
                layer.color
            )));
        }
        Ok(())
    }

    /// The theme to render with when not rendering every theme.
    pub fn effective_theme(&self) -> &str {
        self.theme
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_THEME)
    }

    pub fn enabled_layers(&self) -> impl Iterator<Item = &CustomLayer> {
        self.custom_layers.iter().filter(|l| l.enabled)
    }

    /// Colors worth forwarding; an all-empty override is dropped.
    pub fn color_overrides(&self) -> Option<&CustomColors> {
        self.custom_colors.as_ref().filter(|c| !c.is_empty())
    }

    pub fn worker_payload(&self) -> WorkerPayload<'_> {
        WorkerPayload {
            city: &self.city,
            country: &self.country,
            style: self.effective_theme(),
            all_themes: self.all_themes,
            distance: self.distance,
            width: self.width.unwrap_or(DEFAULT_WIDTH_IN),
            height: self.height.unwrap_or(DEFAULT_HEIGHT_IN),
            country_label: self.country_label.as_deref(),
            name_label: self.name_label.as_deref(),
            custom_layers: self.enabled_layers().collect(),
            custom_colors: self.color_overrides(),
            format: &self.format,
            dpi: self.dpi,
            margins: self.margins,
            paper_size: self.paper_size.as_deref(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> JobError {
    JobError::Validation(msg.into())
}

/// JSON body sent to the inline renderer and the remote queue.
#[derive(Debug, Serialize)]
pub struct WorkerPayload<'a> {
    pub city: &'a str,
    pub country: &'a str,
    pub style: &'a str,
    pub all_themes: bool,
    pub distance: i64,
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_label: Option<&'a str>,
    pub custom_layers: Vec<&'a CustomLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_colors: Option<&'a CustomColors>,
    pub format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<&'a str>,
}
