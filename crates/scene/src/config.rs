//! Configuration loading for the visual options.
//!
//! Constant option values are loaded from a TOML file; callbacks are added
//! in code on the [`VisOptions`] built from it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::attr::Attr;
use crate::layers::{LayerBatching, DEFAULT_PARTICLE_CAPACITY};
use crate::options::{AgentStyle, BackgroundStyle, UpdateToggles, VisOptions, ZIndexUpdate};
use crate::text::{TextAlign, TextPosition};

/// Complete visual configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisConfig {
    /// Frame loop and scene-wide settings
    #[serde(default)]
    pub vis: GeneralConfig,
    /// Layer batching
    #[serde(default)]
    pub layers: LayersConfig,
    /// Background sprite
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub square: AgentStyleConfig,
    #[serde(default)]
    pub zone: AgentStyleConfig,
    #[serde(default)]
    pub actor: AgentStyleConfig,
    /// Which callbacks are re-evaluated each frame
    #[serde(default)]
    pub update: UpdateConfig,
}

impl VisConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serializes this configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String, TomlSerializeError> {
        toml::to_string_pretty(self).map_err(TomlSerializeError)
    }

    /// Build runtime options with every attribute constant.
    pub fn into_options(self) -> VisOptions {
        VisOptions {
            run: self.vis.run,
            max_fps: self.vis.max_fps,
            cleanup: self.vis.cleanup,
            images: self.vis.images,
            base_color: self.vis.base_color,
            base_alpha: self.vis.base_alpha,
            basic_circle_radius: self.vis.basic_circle_radius,
            advanced_circle_scale: self.vis.advanced_circle_scale,
            back_batching: self.layers.back.into(),
            middle_batching: self.layers.middle.into(),
            front_batching: self.layers.front.into(),
            background: self.background.into(),
            square: self.square.into(),
            zone: self.zone.into(),
            actor: self.actor.into(),
            update: self.update.into(),
        }
    }
}

/// Scene-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Start ticking once set up
    pub run: bool,
    /// Frame rate cap, zero for uncapped
    pub max_fps: f32,
    /// Destroy the scene when the simulation finishes
    pub cleanup: bool,
    /// Image assets to preload before setup
    pub images: Vec<String>,
    /// Clear color as 0xRRGGBB
    pub base_color: u32,
    pub base_alpha: f32,
    /// Radius of the shared basic actor circle texture
    pub basic_circle_radius: f32,
    /// Oversampling for advanced actor circles
    pub advanced_circle_scale: f32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        let options = VisOptions::default();
        Self {
            run: options.run,
            max_fps: options.max_fps,
            cleanup: options.cleanup,
            images: options.images,
            base_color: options.base_color,
            base_alpha: options.base_alpha,
            basic_circle_radius: options.basic_circle_radius,
            advanced_circle_scale: options.advanced_circle_scale,
        }
    }
}

/// Particle batching for a layer: `false`, `true` (default capacity) or a
/// capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticleSetting {
    Enabled(bool),
    Capacity(u32),
}

impl Default for ParticleSetting {
    fn default() -> Self {
        ParticleSetting::Enabled(false)
    }
}

impl From<ParticleSetting> for LayerBatching {
    fn from(setting: ParticleSetting) -> Self {
        match setting {
            ParticleSetting::Enabled(false) => LayerBatching::Standard,
            ParticleSetting::Enabled(true) => LayerBatching::from_capacity(Some(DEFAULT_PARTICLE_CAPACITY)),
            ParticleSetting::Capacity(capacity) => LayerBatching::from_capacity(Some(capacity)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayersConfig {
    pub back: ParticleSetting,
    pub middle: ParticleSetting,
    pub front: ParticleSetting,
}

/// Background sprite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub enabled: bool,
    pub tint: u32,
    pub alpha: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub tile: bool,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tint: 0xffffff,
            alpha: 1.0,
            image: None,
            tile: false,
        }
    }
}

impl From<BackgroundConfig> for BackgroundStyle {
    fn from(c: BackgroundConfig) -> Self {
        Self {
            enabled: c.enabled,
            tint: Attr::Constant(c.tint),
            alpha: Attr::Constant(c.alpha),
            image: Attr::Constant(c.image),
            tile: c.tile,
        }
    }
}

/// Constant style of one agent kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStyleConfig {
    pub tint: u32,
    pub alpha: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub text_position: TextPosition,
    pub text_padding: f32,
    pub text_align: TextAlign,
    pub text_tint: u32,
    pub text_alpha: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    pub font_size: f32,
    pub text_rotate: bool,
    pub text_max_width: f32,
    pub advanced: bool,
    pub line_color: u32,
    pub line_alpha: f32,
    pub line_width: f32,
    pub line_align: f32,
    pub fill_color: u32,
    pub fill_alpha: f32,
    pub tile: bool,
}

impl Default for AgentStyleConfig {
    fn default() -> Self {
        Self {
            tint: 0xffffff,
            alpha: 1.0,
            image: None,
            text: None,
            text_position: TextPosition::Center,
            text_padding: 3.0,
            text_align: TextAlign::Center,
            text_tint: 0x000000,
            text_alpha: 1.0,
            font_name: None,
            font_size: 16.0,
            text_rotate: false,
            text_max_width: 0.0,
            advanced: false,
            line_color: 0x000000,
            line_alpha: 1.0,
            line_width: 1.0,
            line_align: 0.5,
            fill_color: 0xffffff,
            fill_alpha: 1.0,
            tile: false,
        }
    }
}

impl From<AgentStyleConfig> for AgentStyle {
    fn from(c: AgentStyleConfig) -> Self {
        Self {
            tint: Attr::Constant(c.tint),
            alpha: Attr::Constant(c.alpha),
            image: Attr::Constant(c.image),
            text: Attr::Constant(c.text),
            text_position: Attr::Constant(c.text_position),
            text_padding: Attr::Constant(c.text_padding),
            text_align: Attr::Constant(c.text_align),
            text_tint: Attr::Constant(c.text_tint),
            text_alpha: Attr::Constant(c.text_alpha),
            font_name: Attr::Constant(c.font_name),
            font_size: Attr::Constant(c.font_size),
            text_rotate: Attr::Constant(c.text_rotate),
            text_max_width: Attr::Constant(c.text_max_width),
            advanced: Attr::Constant(c.advanced),
            line_color: Attr::Constant(c.line_color),
            line_alpha: Attr::Constant(c.line_alpha),
            line_width: Attr::Constant(c.line_width),
            line_align: Attr::Constant(c.line_align),
            fill_color: Attr::Constant(c.fill_color),
            fill_alpha: Attr::Constant(c.fill_alpha),
            tile: Attr::Constant(c.tile),
        }
    }
}

/// Update toggles. `z_index` here is on/off; predicates are set in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub tint: bool,
    pub alpha: bool,
    pub image: bool,
    pub text: bool,
    pub text_tint: bool,
    pub text_alpha: bool,
    pub font_name: bool,
    pub font_size: bool,
    pub radius: bool,
    pub pointing: bool,
    pub shape: bool,
    pub z_index: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        let toggles = UpdateToggles::default();
        Self {
            tint: toggles.tint,
            alpha: toggles.alpha,
            image: toggles.image,
            text: toggles.text,
            text_tint: toggles.text_tint,
            text_alpha: toggles.text_alpha,
            font_name: toggles.font_name,
            font_size: toggles.font_size,
            radius: toggles.radius,
            pointing: toggles.pointing,
            shape: toggles.shape,
            z_index: toggles.z_index.is_enabled(),
        }
    }
}

impl From<UpdateConfig> for UpdateToggles {
    fn from(c: UpdateConfig) -> Self {
        Self {
            tint: c.tint,
            alpha: c.alpha,
            image: c.image,
            text: c.text,
            text_tint: c.text_tint,
            text_alpha: c.text_alpha,
            font_name: c.font_name,
            font_size: c.font_size,
            radius: c.radius,
            pointing: c.pointing,
            shape: c.shape,
            z_index: if c.z_index {
                ZIndexUpdate::Always
            } else {
                ZIndexUpdate::Never
            },
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Error that can occur during TOML serialization.
#[derive(Debug, Error)]
#[error("TOML serialize error: {0}")]
pub struct TomlSerializeError(#[source] pub toml::ser::Error);

/// Returns the default configuration as a TOML string.
pub fn default_config_toml() -> String {
    VisConfig::default()
        .to_toml()
        .unwrap_or_else(|e| format!("# Error generating config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = VisConfig::default();
        assert!(config.vis.run);
        assert_eq!(config.vis.base_color, 0x808080);
        assert_eq!(config.actor.font_size, 16.0);
        assert!(config.update.tint);
        assert!(!config.update.z_index);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
            [vis]
            max_fps = 30.0

            [zone]
            tint = 0x2ca02c
            text = "field"
            text_position = "top-left"
            tile = true

            [layers]
            middle = 500
            front = true

            [update]
            z_index = true
        "#;

        let config = VisConfig::from_str(toml).unwrap();
        assert_eq!(config.vis.max_fps, 30.0);
        assert!(config.vis.run);
        assert_eq!(config.zone.tint, 0x2ca02c);
        assert_eq!(config.zone.text_position, TextPosition::TopLeft);
        assert_eq!(config.square.tint, 0xffffff);

        let options = config.into_options();
        assert_eq!(options.middle_batching, LayerBatching::Particles { capacity: 500 });
        assert_eq!(
            options.front_batching,
            LayerBatching::Particles {
                capacity: DEFAULT_PARTICLE_CAPACITY
            }
        );
        assert_eq!(options.back_batching, LayerBatching::Standard);
        assert!(options.update.z_index.is_enabled());
        assert!(!options.zone.text.is_dynamic());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = VisConfig::default();
        config.actor.advanced = true;
        config.background.image = Some("img/grass.png".into());

        let toml = config.to_toml().unwrap();
        let parsed = VisConfig::from_str(&toml).unwrap();
        assert!(parsed.actor.advanced);
        assert_eq!(parsed.background.image.as_deref(), Some("img/grass.png"));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[actor]\nalpha = 0.5").unwrap();

        let config = VisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.actor.alpha, 0.5);
    }

    #[test]
    fn test_parse_error() {
        let result = VisConfig::from_str("[vis]\nrun = \"yes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = VisConfig::from_file(Path::new("/nonexistent/vis.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
