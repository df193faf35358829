//! Editor tuning constants.
//!
//! Every pixel tolerance, size floor, timing window and zoom bound lives in
//! [`EditorConfig`], which is injected into each component at construction.
//! Hosts may ship a JSON file overriding any subset of the fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing or validating a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse editor config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid editor config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Axis-aligned crop box tolerances, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragBoxConfig {
    /// Hit tolerance around edges and corners.
    pub anchor_size: f32,
    /// Floor for both box dimensions.
    pub min_box_size: f32,
}

impl Default for DragBoxConfig {
    fn default() -> Self {
        Self {
            anchor_size: 80.0,
            min_box_size: 160.0,
        }
    }
}

/// Rotatable text box tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatableBoxConfig {
    pub anchor_size: f32,
    pub min_rect_size: f32,
    /// Distance from the bottom edge to the rotation handle center.
    pub rotation_distance: f32,
    pub double_tap_interval_ms: u64,
}

impl Default for RotatableBoxConfig {
    fn default() -> Self {
        Self {
            anchor_size: 40.0,
            min_rect_size: 40.0,
            rotation_distance: 120.0,
            double_tap_interval_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub double_tap_interval_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_interval_ms: 300,
        }
    }
}

/// Pan/zoom limits for the image view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Fraction of the smaller viewport side kept as an off-screen margin.
    pub margin_ratio: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom reached by a double-tap from the fitted view.
    pub zoom_on_factor: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            margin_ratio: 0.2,
            min_zoom: 0.5,
            max_zoom: 2.0,
            zoom_on_factor: 2.0,
        }
    }
}

/// All editor tunables.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub crop_box: DragBoxConfig,
    pub text_box: RotatableBoxConfig,
    pub gesture: GestureConfig,
    pub view: ViewConfig,
}

impl EditorConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                tracing::warn!(?err, ?path, "failed to load editor config; using defaults");
                Self::default()
            }),
            Err(err) => {
                tracing::warn!(?err, ?path, "failed to read editor config; using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be positive",
                })
            }
        }

        positive("crop_box.anchor_size", self.crop_box.anchor_size)?;
        positive("crop_box.min_box_size", self.crop_box.min_box_size)?;
        positive("text_box.anchor_size", self.text_box.anchor_size)?;
        positive("text_box.min_rect_size", self.text_box.min_rect_size)?;
        positive("text_box.rotation_distance", self.text_box.rotation_distance)?;
        positive("view.min_zoom", self.view.min_zoom)?;
        positive("view.max_zoom", self.view.max_zoom)?;
        positive("view.zoom_on_factor", self.view.zoom_on_factor)?;

        if !(0.0..0.5).contains(&self.view.margin_ratio) {
            return Err(ConfigError::Invalid {
                field: "view.margin_ratio",
                reason: "must be in [0, 0.5)",
            });
        }
        if self.view.min_zoom > 1.0 || self.view.max_zoom < 1.0 {
            return Err(ConfigError::Invalid {
                field: "view.min_zoom",
                reason: "zoom range must include 1.0",
            });
        }
        Ok(())
    }
}
