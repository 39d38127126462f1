//! Configuration types for dnnscale

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level settings, loadable from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the pretrained `.pb` weights
    pub models_dir: PathBuf,
    /// Show a progress bar while upscaling video
    pub progress: bool,
    /// Video encoder settings
    pub video: VideoSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            progress: true,
            video: VideoSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Parse settings from TOML text; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.video.bitrate_kbps == 0 {
            return Err(Error::Config("video.bitrate_kbps must be positive".into()));
        }
        if self.video.gop_size == 0 {
            return Err(Error::Config("video.gop_size must be positive".into()));
        }
        Ok(())
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

/// Encoder settings for video output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Target bitrate in kbps (ignored by uncompressed codecs)
    pub bitrate_kbps: u32,
    /// Keyframe interval in frames
    pub gop_size: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            bitrate_kbps: 8000,
            gop_size: 12,
        }
    }
}

impl VideoSettings {
    pub fn with_bitrate_kbps(mut self, bitrate: u32) -> Self {
        self.bitrate_kbps = bitrate;
        self
    }

    pub fn with_gop_size(mut self, gop: u32) -> Self {
        self.gop_size = gop;
        self
    }
}
