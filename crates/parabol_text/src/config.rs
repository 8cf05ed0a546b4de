//! Engine configuration (parabol.toml)

use crate::{Result, TextError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A font registered from resources at startup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundledFont {
    pub name: String,
    pub path: String,
}

/// Tunables of the glyph-atlas engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Code points per atlas page
    pub chars_per_page: u32,
    /// Pixel padding between atlas cells
    pub padding: u32,
    /// Extra cell width for slanted (italic, bold-italic) glyphs
    pub italic_padding: f32,
    /// Visual calibration: text is drawn this many layout units higher
    pub draw_offset_y: f32,
    /// Namespace of generated atlas texture ids
    pub texture_namespace: String,
    /// Font used by `FontManager::default_renderer`
    pub default_font: String,
    pub bundled_fonts: Vec<BundledFont>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chars_per_page: 256,
            padding: 5,
            italic_padding: 1.3,
            draw_offset_y: 3.0,
            texture_namespace: "parabol".to_string(),
            default_font: "RobotoRegular".to_string(),
            bundled_fonts: vec![BundledFont {
                name: "RobotoRegular".to_string(),
                path: "parabol-assets/font/Roboto-Regular.ttf".to_string(),
            }],
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| TextError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or from `parabol.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join("parabol.toml")
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            TextError::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chars_per_page == 0 {
            return Err(TextError::Config(
                "chars_per_page must be at least 1".to_string(),
            ));
        }
        if !self.italic_padding.is_finite() || self.italic_padding < 0.0 {
            return Err(TextError::Config(
                "italic_padding must be a non-negative number".to_string(),
            ));
        }
        if self.texture_namespace.is_empty() || self.texture_namespace.contains(':') {
            return Err(TextError::Config(format!(
                "invalid texture namespace '{}'",
                self.texture_namespace
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TextError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("chars_per_page = 128\n").unwrap();
        assert_eq!(config.chars_per_page, 128);
        assert_eq!(config.padding, 5);
        assert_eq!(config.default_font, "RobotoRegular");
    }

    #[test]
    fn test_bundled_fonts_table() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_font = "Mono"

            [[bundled_fonts]]
            name = "Mono"
            path = "fonts/mono.ttf"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.bundled_fonts,
            vec![BundledFont {
                name: "Mono".to_string(),
                path: "fonts/mono.ttf".to_string(),
            }]
        );
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("chars_per_page = 0"),
            Err(TextError::Config(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let toml = EngineConfig::default().to_toml().unwrap();
        assert_eq!(
            EngineConfig::from_toml_str(&toml).unwrap(),
            EngineConfig::default()
        );
    }
}
