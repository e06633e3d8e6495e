//! Engine configuration
//!
//! Tolerances and interaction constants are plain data with sensible
//! defaults. They can be adjusted with the builder methods or loaded from a
//! TOML file in which every section and key is optional:
//!
//! ```toml
//! [snap]
//! distance_mm = 2.0
//! angle_deg = 5.0
//!
//! [interaction]
//! drag_threshold_px = 8.0
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading an engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config value '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

/// Port matching tolerances
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Maximum distance between two ports that still counts as connected
    pub distance_mm: f64,
    /// Maximum deviation from exactly opposite tangents, in degrees
    pub angle_deg: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            distance_mm: 2.0,
            angle_deg: 5.0,
        }
    }
}

impl SnapConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the distance tolerance
    pub fn with_distance(mut self, distance_mm: f64) -> Self {
        self.distance_mm = distance_mm;
        self
    }

    /// Set the angular tolerance
    pub fn with_angle(mut self, angle_deg: f64) -> Self {
        self.angle_deg = angle_deg;
        self
    }
}

/// Pointer interaction constants, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Movement along either axis needed to promote a press into a drag
    pub drag_threshold_px: f64,
    /// How far from a track centerline a press still hits the segment
    pub hit_tolerance_px: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 8.0,
            hit_tolerance_px: 6.0,
        }
    }
}

/// Fixed pixel box that catalog preview glyphs are fitted into
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreviewBox {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for PreviewBox {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 24.0,
            padding: 4.0,
        }
    }
}

impl PreviewBox {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }
}

/// World rendering settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Pixels per millimetre at zoom 1.0
    pub scale_mm_to_px: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale_mm_to_px: 1.0,
        }
    }
}

/// Configuration options for the whole engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub interaction: InteractionConfig,
    pub preview: PreviewBox,
    pub render: RenderSettings,
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the snap tolerances
    pub fn with_snap(mut self, snap: SnapConfig) -> Self {
        self.snap = snap;
        self
    }

    /// Set the drag threshold in pixels
    pub fn with_drag_threshold(mut self, px: f64) -> Self {
        self.interaction.drag_threshold_px = px;
        self
    }

    /// Set the hit tolerance in pixels
    pub fn with_hit_tolerance(mut self, px: f64) -> Self {
        self.interaction.hit_tolerance_px = px;
        self
    }

    /// Set the preview glyph box
    pub fn with_preview(mut self, preview: PreviewBox) -> Self {
        self.preview = preview;
        self
    }

    /// Set the millimetre to pixel scale
    pub fn with_scale_mm_to_px(mut self, scale: f64) -> Self {
        self.render.scale_mm_to_px = scale;
        self
    }

    /// Reject values that would make matching or rendering meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("snap.distance_mm", self.snap.distance_mm, true),
            ("snap.angle_deg", self.snap.angle_deg, true),
            (
                "interaction.drag_threshold_px",
                self.interaction.drag_threshold_px,
                true,
            ),
            (
                "interaction.hit_tolerance_px",
                self.interaction.hit_tolerance_px,
                true,
            ),
            ("render.scale_mm_to_px", self.render.scale_mm_to_px, false),
        ];
        for (key, value, zero_ok) in checks {
            let ok = value.is_finite() && (value > 0.0 || (zero_ok && value == 0.0));
            if !ok {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    reason: format!("{} is out of range", value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.snap.distance_mm, 2.0);
        assert_eq!(config.snap.angle_deg, 5.0);
        assert_eq!(config.interaction.drag_threshold_px, 8.0);
        assert_eq!(config.preview, PreviewBox::new(40.0, 24.0, 4.0));
        assert_eq!(config.render.scale_mm_to_px, 1.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_snap(SnapConfig::new().with_distance(1.0).with_angle(3.0))
            .with_drag_threshold(4.0)
            .with_scale_mm_to_px(0.5);

        assert_eq!(config.snap.distance_mm, 1.0);
        assert_eq!(config.snap.angle_deg, 3.0);
        assert_eq!(config.interaction.drag_threshold_px, 4.0);
        assert_eq!(config.render.scale_mm_to_px, 0.5);
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_str(
            r#"
[snap]
distance_mm = 1.0
"#,
        )
        .unwrap();
        assert_eq!(config.snap.distance_mm, 1.0);
        assert_eq!(config.snap.angle_deg, 5.0);
        assert_eq!(config.interaction, InteractionConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let err = EngineConfig::from_str("[render]\nscale_mm_to_px = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("render.scale_mm_to_px"));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            EngineConfig::from_str("[snap\n"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
