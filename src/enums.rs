use serde::{Deserialize, Serialize};

/// Relation between stored sample order and display brightness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhotometricPolarity {
    /// Higher samples are brighter (`MONOCHROME2`).
    #[default]
    Normal,
    /// Higher samples are darker (`MONOCHROME1`).
    Inverted,
}

impl PhotometricPolarity {
    pub fn from_interpretation(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("MONOCHROME1") {
            Self::Inverted
        } else {
            Self::Normal
        }
    }
}

/// How a mask is drawn in its own side-by-side panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskColorMode {
    #[default]
    Grayscale,
    Rgb,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Windowed slice only.
    #[default]
    Plain,
    /// Mask blended onto the full-range slice.
    Overlay,
    /// Windowed slice next to the mask panel.
    SideBySide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
}
