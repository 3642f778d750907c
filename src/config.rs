//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user `config.toml` in the config directory overrides
//! individual keys on top of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! root = "public"               # Public web root
//! originals = "uploads"         # Full-size images (relative to root)
//! thumbnails = "uploads/thumbs" # Thumbnails (relative to root)
//! webp = "uploads/webp"         # WebP variants (relative to root)
//!
//! [images]
//! max_upload_mb = 8             # Upload size limit, 1-50
//! max_width = 2048              # Main image width cap
//! quality = 90                  # JPEG quality for the main image
//!
//! [thumbnails]
//! max_width = 600
//! quality = 85
//!
//! [webp]
//! enabled = true
//! quality = 80
//!
//! [backend]
//! kind = "auto"                 # auto | rust | basic
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [thumbnails]
//! max_width = 480
//! ```
//!
//! Unknown keys are rejected to catch typos early. The upload size limit can
//! additionally be overridden per request from the settings store; see
//! [`PipelineOptions::resolve`](crate::upload::PipelineOptions::resolve).

use crate::imaging::BackendKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

/// Smallest and largest accepted upload size limit, in MiB.
pub const MIN_UPLOAD_MB: u32 = 1;
pub const MAX_UPLOAD_MB: u32 = 50;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Where artifacts are written.
    pub storage: StorageConfig,
    /// Upload limits and main image settings.
    pub images: ImagesConfig,
    /// Thumbnail settings.
    pub thumbnails: ThumbnailsConfig,
    /// Optional WebP variant settings.
    pub webp: WebpConfig,
    /// Image backend selection.
    pub backend: BackendConfig,
}

/// Three parallel artifact directories under one public root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Public web root; relative paths handed to the artwork store resolve
    /// against it.
    pub root: String,
    pub originals: String,
    pub thumbnails: String,
    pub webp: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "public".to_string(),
            originals: "uploads".to_string(),
            thumbnails: "uploads/thumbs".to_string(),
            webp: "uploads/webp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Default upload size limit in MiB.
    pub max_upload_mb: u32,
    /// Main images wider than this are downscaled.
    pub max_width: u32,
    /// JPEG encoding quality for the main image (1-100).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 8,
            max_width: 2048,
            quality: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    pub max_width: u32,
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            max_width: 600,
            quality: 85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebpConfig {
    /// Produce the WebP variant when the backend can encode it.
    pub enabled: bool,
    pub quality: u32,
}

impl Default for WebpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: 80,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub kind: BackendKind,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mb = self.images.max_upload_mb;
        if !(MIN_UPLOAD_MB..=MAX_UPLOAD_MB).contains(&mb) {
            return Err(ConfigError::Validation(format!(
                "images.max_upload_mb must be {MIN_UPLOAD_MB}-{MAX_UPLOAD_MB}, got {mb}"
            )));
        }
        if self.images.max_width == 0 {
            return Err(ConfigError::Validation(
                "images.max_width must be non-zero".into(),
            ));
        }
        if self.thumbnails.max_width == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_width must be non-zero".into(),
            ));
        }
        if self.thumbnails.max_width > self.images.max_width {
            return Err(ConfigError::Validation(
                "thumbnails.max_width must not exceed images.max_width".into(),
            ));
        }
        for (key, quality) in [
            ("images.quality", self.images.quality),
            ("thumbnails.quality", self.thumbnails.quality),
            ("webp.quality", self.webp.quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }

        let dirs = [
            ("storage.originals", &self.storage.originals),
            ("storage.thumbnails", &self.storage.thumbnails),
            ("storage.webp", &self.storage.webp),
        ];
        for (key, dir) in dirs {
            check_relative_dir(key, dir)?;
        }
        let normalized: Vec<&str> = dirs
            .iter()
            .map(|(_, dir)| dir.trim_end_matches('/'))
            .collect();
        if normalized[0] == normalized[1]
            || normalized[0] == normalized[2]
            || normalized[1] == normalized[2]
        {
            return Err(ConfigError::Validation(
                "storage.originals, storage.thumbnails and storage.webp must be distinct".into(),
            ));
        }
        Ok(())
    }
}

/// A storage directory must stay inside the public root.
fn check_relative_dir(key: &str, dir: &str) -> Result<(), ConfigError> {
    if dir.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    let safe = Path::new(dir)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(ConfigError::Validation(format!(
            "{key} must be a relative path without '..', got {dir:?}"
        )));
    }
    Ok(())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(dir = %dir.display(), "configuration loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Artfolio Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Storage layout
# ---------------------------------------------------------------------------
[storage]
# Public web root. Artifact paths stored with an artwork are relative to it.
root = "public"

# Three parallel directories, relative to the root. Main images and
# thumbnails share a filename; WebP variants use the same stem + ".webp".
originals = "uploads"
thumbnails = "uploads/thumbs"
webp = "uploads/webp"

# ---------------------------------------------------------------------------
# Uploads and the main image
# ---------------------------------------------------------------------------
[images]
# Default upload size limit in MiB (1-50). The `max_upload_size` site
# setting overrides this per request.
max_upload_mb = 8

# Wider images are downscaled to this width. Images are never upscaled.
max_width = 2048

# JPEG quality for the main image (1-100). PNG output is lossless.
quality = 90

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Derived from the processed main image. Must not exceed images.max_width.
max_width = 600
quality = 85

# ---------------------------------------------------------------------------
# WebP variant
# ---------------------------------------------------------------------------
[webp]
# Skipped silently when the backend has no WebP encoder.
enabled = true
quality = 80

# ---------------------------------------------------------------------------
# Image backend
# ---------------------------------------------------------------------------
[backend]
# "auto" picks the full backend when WebP encoding is available,
# "rust" forces it, "basic" forces the fallback (no WebP variant).
kind = "auto"
"##
}
