use crate::enums::MaskColorMode;

use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for one viewer session.
///
/// Passed explicitly into [`crate::session::ViewerSession::new`]. Every field
/// has a default, so a JSON file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub autoplay_interval_ms: u64,
    /// Accumulated wheel delta needed for one slice step.
    pub scroll_threshold: i32,
    pub overlay_alpha: f32,
    pub highlight_color: [u8; 3],
    pub mask_color_mode: MaskColorMode,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: 300,
            scroll_threshold: 120,
            overlay_alpha: 0.3,
            highlight_color: [255, 0, 0],
            mask_color_mode: MaskColorMode::Grayscale,
        }
    }
}

impl ViewerConfig {
    /// Load a config from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autoplay_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "autoplay_interval_ms must be positive".into(),
            ));
        }
        if self.scroll_threshold <= 0 {
            return Err(ConfigError::Invalid(
                "scroll_threshold must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.overlay_alpha) {
            return Err(ConfigError::Invalid(format!(
                "overlay_alpha {} is outside [0, 1]",
                self.overlay_alpha
            )));
        }
        Ok(())
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_viewer_behaviour() {
        let config = ViewerConfig::default();
        assert_eq!(config.autoplay_interval(), Duration::from_millis(300));
        assert_eq!(config.scroll_threshold, 120);
        assert_eq!(config.highlight_color, [255, 0, 0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "overlay_alpha": 0.5, "mask_color_mode": "rgb" }}"#).expect("write");

        let config = ViewerConfig::from_json_file(file.path()).expect("config");
        assert_eq!(config.overlay_alpha, 0.5);
        assert_eq!(config.mask_color_mode, MaskColorMode::Rgb);
        assert_eq!(config.scroll_threshold, 120);
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let config = ViewerConfig {
            overlay_alpha: 1.5,
            ..ViewerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
