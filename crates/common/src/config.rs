//! Application configuration.
//!
//! The whole configuration is read once per run and then treated as an
//! immutable value: components receive `&AppConfig` (or one of its
//! sections) and never mutate it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::{ShortformError, ShortformResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input, output and staging locations.
    pub paths: PathsConfig,

    /// Caption styling and background effects.
    pub style: StyleConfig,

    /// Output frame geometry.
    pub video: VideoConfig,

    /// Caption timing transforms.
    pub captions: CaptionConfig,

    /// Encoder parameters for the composition pass.
    pub encoding: EncodingConfig,

    /// Quality touch-up pass applied after composition.
    pub enhance: EnhanceConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Filesystem locations used by a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `<id>_tts.mp3` / `<id>_subs.srt` pairs.
    pub stories_dir: PathBuf,

    /// Directory holding looping background clips.
    pub backgrounds_dir: PathBuf,

    /// Directory where finished videos are written.
    pub output_dir: PathBuf,

    /// Directory searched for local `<font>.ttf` files.
    pub fonts_dir: PathBuf,

    /// Where job-scoped caption copies are staged. Defaults to the
    /// system temp directory.
    pub staging_dir: Option<PathBuf>,
}

/// Caption look and background effect parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Preferred font family.
    pub font_primary: String,

    /// Fonts tried in order when the primary is unavailable.
    pub font_fallback: Vec<String>,

    pub font_size: u32,
    pub font_color: Rgb,
    pub outline_color: Rgb,
    pub outline_width: u32,
    pub bold: bool,

    /// Draw captions on an opaque box instead of outline + shadow.
    pub boxed: bool,

    pub background_color: Rgb,

    /// Opacity of the caption box in `[0, 1]`.
    pub background_opacity: f64,

    pub text_align: TextAlign,

    /// Vertical margin from the bottom edge, in script pixels.
    pub margin_v: u32,

    /// Left and right margins, in script pixels.
    pub margin_h: u32,

    /// Optional background effects.
    pub effects: VideoEffects,
}

/// Horizontal caption alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Numpad-style alignment code for the bottom row.
    pub fn ass_alignment(self) -> u8 {
        match self {
            TextAlign::Left => 1,
            TextAlign::Center => 2,
            TextAlign::Right => 3,
        }
    }
}

/// Toggles and strengths for the background effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoEffects {
    pub blur: bool,
    pub blur_luma_radius: u32,
    pub blur_luma_power: u32,

    /// Saturation multiplier (1.0 = unchanged).
    pub saturation: f64,

    /// Contrast multiplier (1.0 = unchanged).
    pub contrast: f64,

    pub vignette: bool,

    /// Vignette lens angle in radians.
    pub vignette_angle: f64,
}

impl VideoEffects {
    /// Whether the colour adjustment stage has anything to do.
    pub fn adjusts_color(&self) -> bool {
        (self.saturation - 1.0).abs() > f64::EPSILON || (self.contrast - 1.0).abs() > f64::EPSILON
    }
}

/// Output frame geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Caption timing transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Display safety margin added on both sides of each cue, in seconds.
    pub buffer_secs: f64,

    pub granularity: CaptionGranularity,

    pub buffer_stage: BufferStage,
}

impl CaptionConfig {
    /// Buffer as a duration, rounded to whole milliseconds.
    pub fn buffer(&self) -> std::time::Duration {
        let millis = (self.buffer_secs.max(0.0) * 1000.0).round();
        std::time::Duration::from_millis(millis as u64)
    }
}

/// Whether captions are shown one word at a time or as authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionGranularity {
    Word,
    Cue,
}

/// When the display buffer is applied relative to word redistribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferStage {
    /// Buffer each word cue (the default).
    After,
    /// Buffer the authored cue, then split the widened span.
    Before,
}

/// Encoder parameters for the composition pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub video_codec: String,
    pub crf: u32,
    pub preset: String,
    pub profile: String,
    pub level: String,
    pub audio_codec: String,
    pub audio_bitrate_kbps: u32,
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
}

/// Secondary touch-up pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub enabled: bool,
    pub saturation: f64,
    pub contrast: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "shortform=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            style: StyleConfig::default(),
            video: VideoConfig::default(),
            captions: CaptionConfig::default(),
            encoding: EncodingConfig::default(),
            enhance: EnhanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            stories_dir: PathBuf::from("./cleaned_stories"),
            backgrounds_dir: PathBuf::from("./processed_videos"),
            output_dir: PathBuf::from("./videos"),
            fonts_dir: PathBuf::from("./fonts"),
            staging_dir: None,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_primary: "Impact".to_string(),
            font_fallback: vec![
                "BebasNeue-Regular".to_string(),
                "Helvetica-Bold".to_string(),
                "Verdana-Bold".to_string(),
            ],
            font_size: 20,
            font_color: Rgb::WHITE,
            outline_color: Rgb::BLACK,
            outline_width: 2,
            bold: true,
            boxed: true,
            background_color: Rgb::BLACK,
            background_opacity: 0.5,
            text_align: TextAlign::Center,
            margin_v: 100,
            margin_h: 20,
            effects: VideoEffects::default(),
        }
    }
}

impl Default for VideoEffects {
    fn default() -> Self {
        Self {
            blur: true,
            blur_luma_radius: 2,
            blur_luma_power: 1,
            saturation: 1.2,
            contrast: 1.05,
            vignette: true,
            vignette_angle: std::f64::consts::FRAC_PI_4,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            buffer_secs: 0.2,
            granularity: CaptionGranularity::Word,
            buffer_stage: BufferStage::After,
        }
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            crf: 18,
            preset: "fast".to_string(),
            profile: "high".to_string(),
            level: "4.0".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate_kbps: 192,
            audio_sample_rate: 44100,
            audio_channels: 2,
        }
    }
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            saturation: 1.05,
            contrast: 1.02,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> ShortformResult<Self> {
        if !path.exists() {
            return Err(ShortformError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config as pretty JSON.
    pub fn save_to(&self, path: &Path) -> ShortformResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the renderer cannot use.
    pub fn validate(&self) -> ShortformResult<()> {
        if self.video.width == 0 || self.video.height == 0 {
            return Err(ShortformError::config("video width and height must be positive"));
        }
        if self.video.fps == 0 {
            return Err(ShortformError::config("video fps must be positive"));
        }
        if !self.captions.buffer_secs.is_finite() || self.captions.buffer_secs < 0.0 {
            return Err(ShortformError::config(
                "captions.buffer_secs must be a non-negative number",
            ));
        }
        if !(0.0..=1.0).contains(&self.style.background_opacity) {
            return Err(ShortformError::config(
                "style.background_opacity must lie in [0, 1]",
            ));
        }
        for (name, value) in [
            ("style.effects.saturation", self.style.effects.saturation),
            ("style.effects.contrast", self.style.effects.contrast),
            ("enhance.saturation", self.enhance.saturation),
            ("enhance.contrast", self.enhance.contrast),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ShortformError::config(format!("{name} must be positive")));
            }
        }
        if self.style.font_size == 0 {
            return Err(ShortformError::config("style.font_size must be positive"));
        }
        Ok(())
    }

    /// Directory used for job-scoped caption copies.
    pub fn staging_dir(&self) -> PathBuf {
        self.paths
            .staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("shortform").join("config.json")
}
