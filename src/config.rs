//! Configuration persistence for overlay settings

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for InkColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl InkColor {
    pub const BLACK: InkColor = InkColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

/// Resampling used when baking transformed content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleQuality {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

impl From<SampleQuality> for tiny_skia::FilterQuality {
    fn from(q: SampleQuality) -> Self {
        match q {
            SampleQuality::Nearest => tiny_skia::FilterQuality::Nearest,
            SampleQuality::Bilinear => tiny_skia::FilterQuality::Bilinear,
            SampleQuality::Bicubic => tiny_skia::FilterQuality::Bicubic,
        }
    }
}

/// Overlay configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Physical pixels per density-independent unit on this device
    #[serde(default = "default_device_density")]
    pub device_density: f32,
    /// Initial font size for text overlays, in density-independent units
    #[serde(default = "default_font_size")]
    pub text_font_size: f32,
    /// Initial color for text overlays
    #[serde(default)]
    pub text_color: InkColor,
    /// Font file used to rasterize text overlays
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Scale step for increase/decrease size commands
    #[serde(default = "default_size_step")]
    pub size_step: f32,
    /// Rotation step in degrees for rotate commands
    #[serde(default = "default_rotation_step")]
    pub rotation_step: f32,
    /// Lowest scale reachable by any path
    #[serde(default = "default_min_scale")]
    pub min_scale: f32,
    /// Highest scale reachable by pinching
    #[serde(default = "default_max_gesture_scale")]
    pub max_gesture_scale: f32,
    /// Whether a two-finger twist rotates the overlay
    #[serde(default = "default_true")]
    pub pinch_rotation: bool,
    /// Resampling used when baking
    #[serde(default)]
    pub sample_quality: SampleQuality,
    /// Size of a blank raster layer created by the host
    #[serde(default = "default_layer_size")]
    pub layer_size: (u32, u32),
}

fn default_device_density() -> f32 {
    1.0
}

fn default_font_size() -> f32 {
    20.0
}

fn default_size_step() -> f32 {
    0.1
}

fn default_rotation_step() -> f32 {
    15.0
}

fn default_min_scale() -> f32 {
    0.1
}

fn default_max_gesture_scale() -> f32 {
    5.0
}

fn default_true() -> bool {
    true
}

fn default_layer_size() -> (u32, u32) {
    (1200, 1600)
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            device_density: default_device_density(),
            text_font_size: default_font_size(),
            text_color: InkColor::BLACK,
            font_path: None,
            size_step: default_size_step(),
            rotation_step: default_rotation_step(),
            min_scale: default_min_scale(),
            max_gesture_scale: default_max_gesture_scale(),
            pinch_rotation: true,
            sample_quality: SampleQuality::Bilinear,
            layer_size: default_layer_size(),
        }
    }
}

impl OverlayConfig {
    /// Directory name under the user config dir
    pub const ID: &'static str = "scribble-overlay";

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            log::error!("No config directory available for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Device density guarded against zero or negative values
    pub fn effective_density(&self) -> f32 {
        if self.device_density > 0.0 {
            self.device_density
        } else {
            1.0
        }
    }
}
