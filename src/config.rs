//! Showcase configuration file.
//!
//! Everything has a default matching the original hero page, so an empty
//! object (or no file at all) gives the standard scene:
//!
//! ```json
//! {
//!   "window": { "title": "Portfolio", "width": 1600, "height": 900 },
//!   "layers": [
//!     { "variant": "instanced", "count": 400, "color": "#94a3b8" },
//!     { "variant": "instanced", "count": 150, "color": "#38bdf8", "seed": 2 }
//!   ],
//!   "globe": { "tilt_deg": 23.5, "retry": { "attempts": 5 } },
//!   "headline": { "text": "Hello", "speed_ms": 100, "mode": "hold" }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::field::{FieldConfig, Variant};
use crate::globe::GlobeConfig;
use crate::rules::Rule;
use crate::typewriter::{TypewriterConfig, TypewriterMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "folio".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// One backdrop layer: a variant preset plus optional overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub variant: Variant,
    pub count: usize,
    /// Flat color as `#rrggbb`; ignored by hue-cycling variants.
    pub color: String,
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friction: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallax: Option<f32>,
    /// Replaces the preset's rule set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
}

impl LayerConfig {
    pub fn new(variant: Variant, count: usize, color: &str, seed: u64) -> Self {
        Self {
            variant,
            count,
            color: color.to_string(),
            seed,
            friction: None,
            parallax: None,
            rules: None,
        }
    }

    /// Resolve against the variant preset.
    pub fn to_field_config(&self) -> FieldConfig {
        let mut config = FieldConfig::preset(self.variant)
            .with_count(self.count)
            .with_color(&self.color)
            .with_seed(self.seed);
        if let Some(friction) = self.friction {
            config = config.with_friction(friction);
        }
        if let Some(parallax) = self.parallax {
            config.parallax = parallax;
        }
        if let Some(rules) = &self.rules {
            config = config.with_rules(rules.clone());
        }
        config
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self::new(Variant::default(), 300, "#0ea5e9", 0x5eed)
    }
}

/// The three stacked layers of the hero backdrop.
pub fn standard_layers(variant: Variant) -> Vec<LayerConfig> {
    vec![
        LayerConfig::new(variant, 400, "#94a3b8", 1),
        LayerConfig::new(variant, 150, "#38bdf8", 2),
        LayerConfig::new(variant, 60, "#06b6d4", 3),
    ]
}

/// Top-level showcase configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub window: WindowConfig,
    pub layers: Vec<LayerConfig>,
    pub globe: GlobeConfig,
    pub headline: TypewriterConfig,
}

impl ShowcaseConfig {
    /// Read a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Run every layer with the same variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        for layer in &mut self.layers {
            layer.variant = variant;
        }
        self
    }

    pub fn field_configs(&self) -> Vec<FieldConfig> {
        self.layers.iter().map(LayerConfig::to_field_config).collect()
    }
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            layers: standard_layers(Variant::default()),
            globe: GlobeConfig::default(),
            headline: TypewriterConfig::new("Architecting Future Computing")
                .with_speed(140)
                .with_delay(800)
                .with_mode(TypewriterMode::Loop { pause_ms: 5000 }),
        }
    }
}
