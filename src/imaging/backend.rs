//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: decode, auto-orient, strip metadata, resize and encode. Each
//! backend also reports its [`Capabilities`], so the upload pipeline asks
//! "can this backend encode WebP?" rather than "which backend is this?".
//!
//! Two implementations ship:
//! - [`RustBackend`](super::rust_backend::RustBackend): full-featured,
//!   Lanczos3 resampling, JPEG/PNG/WebP encoding.
//! - [`BasicBackend`](super::basic_backend::BasicBackend): fallback for
//!   environments without a WebP encoder, cheaper resampling.

use super::params::{EncodeParams, OutputFormat, ResizeParams};
use image::DynamicImage;
use image::metadata::Orientation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode {format}: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },
    #[error("{0} encoding is not available on this backend")]
    Unsupported(OutputFormat),
}

/// What a backend can do beyond the baseline (decode JPEG/PNG/WebP,
/// encode JPEG/PNG).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub name: &'static str,
    pub webp_encode: bool,
}

impl Capabilities {
    pub fn can_encode(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Jpeg | OutputFormat::Png => true,
            OutputFormat::WebP => self.webp_encode,
        }
    }
}

/// Pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decoded pixels plus whatever metadata the decoder surfaced.
///
/// `orientation` and `exif` are only meaningful until
/// [`ImageBackend::auto_orient`] and [`ImageBackend::strip_metadata`] have
/// run; after that the pixels are upright and nothing identifying is left.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: DynamicImage,
    pub orientation: Orientation,
    pub exif: Option<Vec<u8>>,
}

impl DecodedImage {
    /// Wrap pixels that carry no metadata.
    pub fn plain(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            orientation: Orientation::NoTransforms,
            exif: None,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.pixels.color().has_alpha()
    }

    /// True once orientation has been applied and metadata removed.
    pub fn is_clean(&self) -> bool {
        self.orientation == Orientation::NoTransforms && self.exif.is_none()
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all operations so the pipeline is
/// backend-agnostic. `Sync` so a single backend instance, selected once at
/// startup, can be shared by every request.
pub trait ImageBackend: Sync {
    /// What this backend supports.
    fn capabilities(&self) -> Capabilities;

    /// Decode an encoded JPEG/PNG/WebP byte stream, reading its orientation.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError>;

    /// Apply the stored orientation to the pixels and reset it.
    fn auto_orient(&self, image: DecodedImage) -> DecodedImage;

    /// Drop every metadata buffer the decoder handed over.
    fn strip_metadata(&self, image: DecodedImage) -> DecodedImage;

    /// Resample to exactly `params.width`×`params.height`.
    fn resize(&self, image: &DecodedImage, params: &ResizeParams)
    -> Result<DecodedImage, BackendError>;

    /// Encode to bytes in the requested format.
    fn encode(&self, image: &DecodedImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}
