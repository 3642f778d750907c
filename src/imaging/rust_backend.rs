//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::ImageReader` + `ImageDecoder` |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality-aware) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy, quality-aware) |
//!
//! WebP output needs the `webp` cargo feature (on by default). Without it the
//! backend reports no WebP encoder and the pipeline skips the variant.

use super::backend::{BackendError, Capabilities, DecodedImage, ImageBackend};
use super::params::{EncodeParams, OutputFormat, ResizeParams};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode `bytes`, reading orientation and the raw EXIF block on the way.
pub(super) fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, BackendError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| BackendError::Decode(e.to_string()))?;

    // Unreadable orientation data is treated as "upright" rather than fatal
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let exif = decoder.exif_metadata().ok().flatten();

    let pixels =
        DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;

    Ok(DecodedImage {
        pixels,
        orientation,
        exif,
    })
}

pub(super) fn orient(mut image: DecodedImage) -> DecodedImage {
    if image.orientation != Orientation::NoTransforms {
        image.pixels.apply_orientation(image.orientation);
        image.orientation = Orientation::NoTransforms;
    }
    image
}

pub(super) fn strip(mut image: DecodedImage) -> DecodedImage {
    image.exif = None;
    image
}

pub(super) fn resample(
    image: &DecodedImage,
    params: &ResizeParams,
    filter: FilterType,
) -> DecodedImage {
    DecodedImage {
        pixels: image.pixels.resize_exact(params.width, params.height, filter),
        orientation: image.orientation,
        exif: image.exif.clone(),
    }
}

/// Encode as JPEG. JPEG has no alpha channel, so pixels are flattened to RGB8.
pub(super) fn encode_jpeg(image: &DecodedImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        &mut out,
        params.quality.value() as u8,
    );
    encoder_pixels(image, OutputFormat::Jpeg)
        .write_with_encoder(encoder)
        .map_err(|e| encode_error(OutputFormat::Jpeg, e))?;
    Ok(out)
}

/// Encode as PNG. Lossless: quality is ignored and alpha is preserved.
pub(super) fn encode_png(image: &DecodedImage) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut out);
    image
        .pixels
        .write_with_encoder(encoder)
        .map_err(|e| encode_error(OutputFormat::Png, e))?;
    Ok(out)
}

/// Pixels in the 8-bit layout an encoder takes: RGBA when both the source
/// and the format have alpha, RGB otherwise.
fn encoder_pixels(image: &DecodedImage, format: OutputFormat) -> DynamicImage {
    if format.supports_alpha() && image.has_alpha() {
        DynamicImage::ImageRgba8(image.pixels.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.pixels.to_rgb8())
    }
}

/// Encode as lossy WebP at `params.quality`, keeping alpha when present.
#[cfg(feature = "webp")]
fn encode_webp(image: &DecodedImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let pixels = encoder_pixels(image, OutputFormat::WebP);
    let encoder = webp::Encoder::from_image(&pixels).map_err(|message| BackendError::Encode {
        format: OutputFormat::WebP,
        message: message.to_string(),
    })?;
    Ok(encoder.encode(params.quality.value() as f32).to_vec())
}

#[cfg(not(feature = "webp"))]
fn encode_webp(_image: &DecodedImage, _params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    Err(BackendError::Unsupported(OutputFormat::WebP))
}

fn encode_error(format: OutputFormat, err: image::ImageError) -> BackendError {
    BackendError::Encode {
        format,
        message: err.to_string(),
    }
}

impl ImageBackend for RustBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            name: "rust",
            webp_encode: cfg!(feature = "webp"),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError> {
        decode_bytes(bytes)
    }

    fn auto_orient(&self, image: DecodedImage) -> DecodedImage {
        orient(image)
    }

    fn strip_metadata(&self, image: DecodedImage) -> DecodedImage {
        strip(image)
    }

    fn resize(
        &self,
        image: &DecodedImage,
        params: &ResizeParams,
    ) -> Result<DecodedImage, BackendError> {
        Ok(resample(image, params, FilterType::Lanczos3))
    }

    fn encode(&self, image: &DecodedImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            OutputFormat::Jpeg => encode_jpeg(image, params),
            OutputFormat::Png => encode_png(image),
            OutputFormat::WebP => encode_webp(image, params),
        }
    }
}
