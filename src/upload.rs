//! Image upload pipeline.
//!
//! Turns one untrusted uploaded file into a validated, normalized artifact
//! set: a width-capped main image, a thumbnail derived from it, and an
//! optional WebP variant.
//!
//! ## Steps
//!
//! 1. **Validate**: upload status, size limit, content-sniffed type, decode.
//!    Failures here are [`ValidationError`]s and happen before any write.
//! 2. **Auto-orient**, then **strip metadata**.
//! 3. **Resize** the main image to `max_width` (never upscaled).
//! 4. **Derive the thumbnail** from the processed main image.
//! 5. **Encode** main, thumbnail and (if the backend can) WebP, in memory.
//! 6. **Persist** under a fresh filename. Every file written is tracked by an
//!    [`ArtifactGuard`]; any failure removes them again, so a failed upload
//!    never leaves part of a set on disk.
//!
//! The output format follows the detected input type: JPEG stays JPEG, PNG
//! stays PNG (transparency preserved), WebP stays WebP.

use crate::config::PipelineConfig;
use crate::imaging::{
    BackendError, DecodedImage, EncodeParams, ImageBackend, OutputFormat, Quality, ResizeParams,
    SniffError, constrain_to_width, needs_resize, sniff_format,
};
use crate::settings::{MAX_UPLOAD_SIZE_KEY, SettingsStore, mib, parse_max_upload_size};
use crate::storage::{self, ArtifactNames, StorageError, StorageLayout};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shown to the user for every encoding failure; the detail goes to the log.
pub const GENERIC_FAILURE_MESSAGE: &str = "Upload failed, please try again.";

// ============================================================================
// Errors
// ============================================================================

/// Client-caused problems. The `Display` text is safe to show the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an image to upload.")]
    NoFile,
    #[error("The upload did not complete. Please try again.")]
    IncompleteUpload,
    #[error("File is too large ({}). The maximum upload size is {}.", human_size(.size), human_size(.limit))]
    TooLarge { size: u64, limit: u64 },
    #[error("{0} images are not supported. Allowed: JPG, PNG, WebP.")]
    UnsupportedType(String),
    #[error("The file is not a valid image.")]
    NotAnImage,
    #[error("The image appears to be corrupt and could not be read.")]
    Corrupt,
}

/// Which artifact of a set an error concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Main,
    Thumbnail,
    WebP,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Main => "main image",
            Self::Thumbnail => "thumbnail",
            Self::WebP => "WebP variant",
        })
    }
}

/// Server-side problems: codec, disk, permissions.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Failed to encode {artifact}: {source}")]
    Encode {
        artifact: Artifact,
        source: BackendError,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Unable to create directory {}: {source}", .path.display())]
    Directory { path: PathBuf, source: io::Error },
    #[error("Failed to read upload {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl UploadError {
    /// Text for the admin UI error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Encoding(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn human_size(bytes: &u64) -> String {
    let mb = *bytes as f64 / mib(1) as f64;
    if *bytes % mib(1) == 0 {
        format!("{mb:.0} MB")
    } else {
        format!("{mb:.1} MB")
    }
}

// ============================================================================
// Inputs and outputs
// ============================================================================

/// Transfer state reported by the web server for an upload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Complete,
    /// The form was submitted without a file.
    NoFile,
    /// The transfer was cut short.
    Partial,
    /// Any other server-side upload failure.
    Failed,
}

/// One uploaded file, as handed over by the web layer.
///
/// Everything except `source_path` and `status` is client-supplied and only
/// used for logging; the bytes decide what the file is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub source_path: PathBuf,
    pub declared_name: Option<String>,
    pub declared_mime: Option<String>,
    pub declared_size: u64,
    pub status: UploadStatus,
}

impl UploadedFile {
    /// A completed upload of a local file, sized from the filesystem.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let declared_size = fs::metadata(path)?.len();
        Ok(Self {
            source_path: path.to_path_buf(),
            declared_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            declared_mime: None,
            declared_size,
            status: UploadStatus::Complete,
        })
    }
}

/// Per-request pipeline settings.
///
/// Built once per request from the config and the settings store, then
/// passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub max_upload_bytes: u64,
    pub max_width: u32,
    pub thumbnail_width: u32,
    pub main_quality: Quality,
    pub thumbnail_quality: Quality,
    /// `None` disables the WebP variant.
    pub webp_quality: Option<Quality>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl PipelineOptions {
    /// Options with the given limits and the default qualities.
    pub fn new(max_upload_bytes: u64, max_width: u32, thumbnail_width: u32) -> Self {
        Self {
            max_upload_bytes,
            max_width,
            thumbnail_width,
            ..Self::default()
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_upload_bytes: mib(config.images.max_upload_mb),
            max_width: config.images.max_width,
            thumbnail_width: config.thumbnails.max_width,
            main_quality: Quality::new(config.images.quality),
            thumbnail_quality: Quality::new(config.thumbnails.quality),
            webp_quality: config.webp.enabled.then(|| Quality::new(config.webp.quality)),
        }
    }

    /// Config values, with the upload limit taken from the settings store
    /// when it holds a usable `max_upload_size`.
    pub fn resolve(config: &PipelineConfig, settings: &(impl SettingsStore + ?Sized)) -> Self {
        let mut options = Self::from_config(config);
        let fallback = config.images.max_upload_mb.to_string();
        let raw = settings.get(MAX_UPLOAD_SIZE_KEY, &fallback);
        match parse_max_upload_size(&raw) {
            Some(bytes) => options.max_upload_bytes = bytes,
            None => warn!(
                value = %raw,
                fallback_mb = config.images.max_upload_mb,
                "ignoring out-of-range max_upload_size setting"
            ),
        }
        options
    }

    pub fn without_webp(mut self) -> Self {
        self.webp_quality = None;
        self
    }
}

/// The persisted result of one upload. Paths are relative to the public root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub uuid: Uuid,
    pub original_path: String,
    pub thumbnail_path: String,
    /// Absent when the backend cannot encode WebP or the variant is disabled.
    pub webp_path: Option<String>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

// ============================================================================
// Cleanup guard
// ============================================================================

/// Removes every tracked file on drop unless [`commit`](Self::commit)ted.
///
/// Covers early returns and panics alike, so a failed upload cannot leave a
/// partial artifact set behind.
#[derive(Debug, Default)]
pub struct ArtifactGuard {
    written: Vec<PathBuf>,
    committed: bool,
}

impl ArtifactGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in self.written.iter().rev() {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed partial artifact"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to remove partial artifact")
                }
            }
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Encoded bytes for one set, ready to be written.
struct EncodedSet {
    main: Vec<u8>,
    thumbnail: Vec<u8>,
    webp: Option<Vec<u8>>,
}

pub struct UploadPipeline<'a> {
    backend: &'a dyn ImageBackend,
    layout: StorageLayout,
    options: PipelineOptions,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(backend: &'a dyn ImageBackend, layout: StorageLayout, options: PipelineOptions) -> Self {
        Self {
            backend,
            layout,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Validate, normalize and persist one upload.
    pub fn process_upload(&self, file: &UploadedFile) -> Result<ArtifactSet, UploadError> {
        let bytes = self.read_validated(file)?;

        let format = sniff_format(&bytes).map_err(|e| match e {
            SniffError::NotAnImage => ValidationError::NotAnImage,
            SniffError::UnsupportedFormat(name) => ValidationError::UnsupportedType(name),
        })?;
        if let Some(declared) = file.declared_mime.as_deref() {
            if declared != format.mime_type() {
                debug!(
                    declared,
                    detected = format.mime_type(),
                    "declared MIME type ignored"
                );
            }
        }

        let decoded = self.backend.decode(&bytes).map_err(|e| {
            debug!(error = %e, "upload failed to decode");
            ValidationError::Corrupt
        })?;
        drop(bytes);
        debug!(
            format = %format,
            width = decoded.pixels.width(),
            height = decoded.pixels.height(),
            orientation = ?decoded.orientation,
            "decoded upload"
        );

        let oriented = self.backend.auto_orient(decoded);
        let clean = self.backend.strip_metadata(oriented);

        let main = self.resize_to_width(clean, self.options.max_width, Artifact::Main)?;
        let thumbnail = self.resize_to_width(
            main.clone(),
            self.options.thumbnail_width,
            Artifact::Thumbnail,
        )?;

        let encoded = self.encode_set(format, &main, &thumbnail)?;

        let names = self.layout.allocate(format).map_err(EncodingError::from)?;
        self.layout
            .ensure_directories(encoded.webp.is_some())
            .map_err(|(path, source)| EncodingError::Directory { path, source })?;

        let webp_path = self.write_set(&names, &encoded)?;

        let set = ArtifactSet {
            uuid: Uuid::new_v4(),
            original_path: names.original,
            thumbnail_path: names.thumbnail,
            webp_path,
            mime_type: format.mime_type().to_string(),
            width: main.pixels.width(),
            height: main.pixels.height(),
            thumbnail_width: thumbnail.pixels.width(),
            thumbnail_height: thumbnail.pixels.height(),
        };
        info!(
            original = %set.original_path,
            webp = set.webp_path.is_some(),
            width = set.width,
            height = set.height,
            "upload processed"
        );
        Ok(set)
    }

    /// Delete an artifact set; see [`StorageLayout::delete_artifacts`].
    pub fn delete_artifacts(&self, original: &str, thumbnail: &str, webp: Option<&str>) -> bool {
        let ok = self.layout.delete_artifacts(original, thumbnail, webp);
        if ok {
            info!(original, "artifacts deleted");
        } else {
            warn!(original, "some artifacts could not be deleted");
        }
        ok
    }

    /// Status and size checks, then read the whole file.
    fn read_validated(&self, file: &UploadedFile) -> Result<Vec<u8>, UploadError> {
        match file.status {
            UploadStatus::Complete => {}
            UploadStatus::NoFile => return Err(ValidationError::NoFile.into()),
            UploadStatus::Partial | UploadStatus::Failed => {
                return Err(ValidationError::IncompleteUpload.into());
            }
        }

        let read_error = |source: io::Error| EncodingError::Read {
            path: file.source_path.clone(),
            source,
        };
        let size = match fs::metadata(&file.source_path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ValidationError::NoFile.into());
            }
            Err(e) => return Err(read_error(e).into()),
        };
        let limit = self.options.max_upload_bytes;
        if size > limit {
            return Err(ValidationError::TooLarge { size, limit }.into());
        }
        if size == 0 {
            return Err(ValidationError::NotAnImage.into());
        }

        let bytes = fs::read(&file.source_path).map_err(read_error)?;
        debug!(
            name = file.declared_name.as_deref().unwrap_or("-"),
            size, "upload passed size check"
        );
        Ok(bytes)
    }

    fn resize_to_width(
        &self,
        image: DecodedImage,
        max_width: u32,
        artifact: Artifact,
    ) -> Result<DecodedImage, EncodingError> {
        let source = (image.pixels.width(), image.pixels.height());
        let (width, height) = constrain_to_width(source, max_width);
        if !needs_resize(source, (width, height)) {
            return Ok(image);
        }
        debug!(%artifact, from = ?source, to = ?(width, height), "resizing");
        self.backend
            .resize(&image, &ResizeParams { width, height })
            .map_err(|source| EncodingError::Encode { artifact, source })
    }

    fn encode_set(
        &self,
        format: OutputFormat,
        main: &DecodedImage,
        thumbnail: &DecodedImage,
    ) -> Result<EncodedSet, EncodingError> {
        let encode = |image: &DecodedImage, quality: Quality, artifact: Artifact| {
            self.backend
                .encode(image, &EncodeParams { format, quality })
                .map_err(|source| {
                    error!(%artifact, %format, error = %source, "encoding failed");
                    EncodingError::Encode { artifact, source }
                })
        };
        let main_bytes = encode(main, self.options.main_quality, Artifact::Main)?;
        let thumbnail_bytes =
            encode(thumbnail, self.options.thumbnail_quality, Artifact::Thumbnail)?;

        let webp = match self.options.webp_quality {
            None => None,
            Some(_) if !self.backend.capabilities().webp_encode => {
                warn!(
                    backend = self.backend.capabilities().name,
                    "WebP encoding unavailable, skipping variant"
                );
                None
            }
            // The main image already is the WebP variant
            Some(_) if format == OutputFormat::WebP => Some(main_bytes.clone()),
            Some(quality) => {
                let params = EncodeParams {
                    format: OutputFormat::WebP,
                    quality,
                };
                match self.backend.encode(main, &params) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        warn!(error = %e, "WebP encoding failed, skipping variant");
                        None
                    }
                }
            }
        };

        Ok(EncodedSet {
            main: main_bytes,
            thumbnail: thumbnail_bytes,
            webp,
        })
    }

    /// Write an encoded set. Returns the WebP path if that variant was
    /// written. Directories must already exist.
    fn write_set(
        &self,
        names: &ArtifactNames,
        encoded: &EncodedSet,
    ) -> Result<Option<String>, EncodingError> {
        let mut guard = ArtifactGuard::new();

        for (relative, bytes) in [
            (&names.original, &encoded.main),
            (&names.thumbnail, &encoded.thumbnail),
        ] {
            let path = self.layout.resolve(relative)?;
            if let Err(source) = write_tracked(&mut guard, &path, bytes) {
                error!(path = %path.display(), error = %source, "artifact write failed");
                return Err(EncodingError::Write { path, source });
            }
        }

        let mut webp_path = None;
        if let Some(bytes) = &encoded.webp {
            let path = self.layout.resolve(&names.webp)?;
            let mut webp_guard = ArtifactGuard::new();
            match write_tracked(&mut webp_guard, &path, bytes) {
                Ok(()) => {
                    webp_guard.commit();
                    guard.track(path);
                    webp_path = Some(names.webp.clone());
                }
                Err(e) => warn!(path = %path.display(), error = %e, "WebP write failed, skipping variant"),
            }
        }

        guard.commit();
        Ok(webp_path)
    }
}

/// Write a new file, tracking it for cleanup whenever it may exist on disk.
///
/// A name collision is not tracked: that file belongs to someone else.
fn write_tracked(guard: &mut ArtifactGuard, path: &Path, bytes: &[u8]) -> io::Result<()> {
    match storage::write_new(path, bytes) {
        Ok(()) => {
            guard.track(path.to_path_buf());
            Ok(())
        }
        Err(e) => {
            if e.kind() != io::ErrorKind::AlreadyExists {
                guard.track(path.to_path_buf());
            }
            Err(e)
        }
    }
}
