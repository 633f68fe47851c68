//! Application configuration.
//!
//! Every tool reads its defaults from one JSON document. Sections are
//! `#[serde(default)]`, so a file only needs the keys it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WebprepError, WebprepResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Thumbnail optimizer settings.
    pub thumbnails: ThumbnailConfig,

    /// Fixed-scale resizer settings.
    pub resize: ResizeConfig,

    /// WebP/AVIF sibling generation settings.
    pub web_variants: WebVariantsConfig,

    /// OTF/TTF to WOFF2 conversion settings.
    pub fonts: FontConfig,

    /// Typing replay pacing.
    pub typing: TypingConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Thumbnail generation for a set of image folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Directory the folder list is relative to.
    pub base_dir: PathBuf,

    /// Folders to scan, relative to `base_dir`. `"."` means `base_dir` itself.
    pub folders: Vec<String>,

    /// Root of the thumbnail tree, relative to `base_dir`.
    pub output_dir: PathBuf,

    /// Images wider than this are scaled down, keeping aspect ratio.
    pub max_width: u32,

    /// Encoder quality (0-100).
    pub quality: u8,

    /// Output format name: webp, jpg, png or avif.
    pub format: String,
}

/// Fixed-factor resize of a single folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Multiplier applied to both dimensions.
    pub scale: f64,
}

/// Sibling `.webp`/`.avif` files next to every jpg/png under a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebVariantsConfig {
    pub root: PathBuf,
    pub webp_quality: u8,
    pub avif_quality: u8,
    /// AVIF encoder speed, 1 (slowest) to 10.
    pub avif_speed: u8,
}

/// Font conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Fonts converted when no files are given on the command line.
    pub files: Vec<PathBuf>,

    /// Brotli quality (0-11).
    pub brotli_quality: u32,
}

/// Pacing for the typing replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Time to switch to the target window before typing starts.
    pub start_delay_ms: u64,

    /// Base delay after each keystroke.
    pub key_delay_ms: u64,

    /// Per-line random offset applied to `key_delay_ms` (uniform, +/-).
    pub key_jitter_ms: u64,

    /// Delay after each line.
    pub line_delay_ms: u64,

    /// Every N-th line gets an extra pause.
    pub pause_every_lines: usize,

    pub pause_min_ms: u64,
    pub pause_max_ms: u64,

    /// Strip leading and trailing whitespace from each line.
    pub trim_lines: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "webprep_imaging=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            folders: vec![".".to_string(), "screenshots".to_string()],
            output_dir: PathBuf::from("thumbs"),
            max_width: 400,
            quality: 75,
            format: "webp".to_string(),
        }
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("screenshots"),
            output_dir: PathBuf::from("resized_images"),
            scale: 0.3,
        }
    }
}

impl Default for WebVariantsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public/assets/images"),
            webp_quality: 80,
            avif_quality: 70,
            avif_speed: 2,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            files: vec![
                PathBuf::from("MonumentExtended.otf"),
                PathBuf::from("MonumentExtended-Ultrabold.otf"),
            ],
            brotli_quality: 11,
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 4000,
            key_delay_ms: 30,
            key_jitter_ms: 30,
            line_delay_ms: 350,
            pause_every_lines: 10,
            pause_min_ms: 1000,
            pause_max_ms: 3000,
            trim_lines: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

const THUMBNAIL_FORMATS: &[&str] = &["webp", "jpg", "jpeg", "png", "avif"];

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

    /// Load config from an explicit path. Errors are returned, not swallowed.
    pub fn load_from(path: &Path) -> WebprepResult<Self> {
        if !path.exists() {
            return Err(WebprepError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> WebprepResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> WebprepResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values no tool can work with.
    pub fn validate(&self) -> WebprepResult<()> {
        let t = &self.thumbnails;
        if t.max_width == 0 {
            return Err(WebprepError::config("thumbnails.max_width must be positive"));
        }
        if t.quality > 100 {
            return Err(WebprepError::config("thumbnails.quality must be 0-100"));
        }
        if !THUMBNAIL_FORMATS.contains(&t.format.to_ascii_lowercase().as_str()) {
            return Err(WebprepError::config(format!(
                "thumbnails.format '{}' is not one of: {}",
                t.format,
                THUMBNAIL_FORMATS.join(", ")
            )));
        }

        let scale = self.resize.scale;
        if !(scale > 0.0 && scale <= 10.0) {
            return Err(WebprepError::config(format!(
                "resize.scale must be in (0, 10], got {scale}"
            )));
        }

        let v = &self.web_variants;
        if v.webp_quality > 100 || v.avif_quality > 100 {
            return Err(WebprepError::config("web_variants qualities must be 0-100"));
        }
        if !(1..=10).contains(&v.avif_speed) {
            return Err(WebprepError::config("web_variants.avif_speed must be 1-10"));
        }

        if self.fonts.brotli_quality > 11 {
            return Err(WebprepError::config("fonts.brotli_quality must be 0-11"));
        }

        let p = &self.typing;
        if p.pause_every_lines == 0 {
            return Err(WebprepError::config("typing.pause_every_lines must be positive"));
        }
        if p.pause_min_ms > p.pause_max_ms {
            return Err(WebprepError::config(
                "typing.pause_min_ms must not exceed typing.pause_max_ms",
            ));
        }

        Ok(())
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
    base.join("webprep").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thumbnails.max_width, 400);
        assert_eq!(config.thumbnails.quality, 75);
        assert!((config.resize.scale - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.typing.pause_every_lines, 10);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let json = r#"{ "thumbnails": { "max_width": 640 }, "resize": { "scale": 0.5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.thumbnails.max_width, 640);
        assert_eq!(config.thumbnails.quality, 75);
        assert_eq!(config.thumbnails.output_dir, PathBuf::from("thumbs"));
        assert!((config.resize.scale - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.fonts, FontConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.typing.start_delay_ms = 0;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, WebprepError::FileNotFound { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.resize.scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.thumbnails.format = "bmp".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.typing.pause_min_ms = 5000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.thumbnails.format = "JPG".to_string();
        assert!(config.validate().is_ok());
    }
}
