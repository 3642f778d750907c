//! Fallback backend for hosts without a WebP encoder.
//!
//! Decodes everything [`RustBackend`](super::RustBackend) decodes and writes
//! JPEG and PNG, but resamples with the cheaper `Triangle` filter and
//! reports `webp_encode: false`. The upload pipeline then skips the WebP
//! variant instead of failing.

use super::backend::{BackendError, Capabilities, DecodedImage, ImageBackend};
use super::params::{EncodeParams, OutputFormat, ResizeParams};
use super::rust_backend::{decode_bytes, encode_jpeg, encode_png, orient, resample, strip};
use image::imageops::FilterType;

#[derive(Debug, Default)]
pub struct BasicBackend;

impl BasicBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ImageBackend for BasicBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            name: "basic",
            webp_encode: false,
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
        Ok(resample(image, params, FilterType::Triangle))
    }

    fn encode(&self, image: &DecodedImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            OutputFormat::Jpeg => encode_jpeg(image, params),
            OutputFormat::Png => encode_png(image),
            OutputFormat::WebP => Err(BackendError::Unsupported(OutputFormat::WebP)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::*;

    #[test]
    fn has_no_webp_encoder() {
        let caps = BasicBackend::new().capabilities();
        assert_eq!(caps.name, "basic");
        assert!(!caps.webp_encode);
    }

    #[test]
    fn still_decodes_webp() {
        let decoded = BasicBackend::new().decode(&webp_bytes(16, 8)).unwrap();
        assert_eq!(decoded.pixels.width(), 16);
    }

    #[test]
    fn refuses_webp_encode() {
        let backend = BasicBackend::new();
        let decoded = backend.decode(&jpeg_bytes(16, 16)).unwrap();
        let result = backend.encode(
            &decoded,
            &EncodeParams {
                format: OutputFormat::WebP,
                quality: Quality::new(80),
            },
        );
        assert!(matches!(
            result,
            Err(BackendError::Unsupported(OutputFormat::WebP))
        ));
    }

    #[test]
    fn resizes_and_encodes_jpeg() {
        let backend = BasicBackend::new();
        let decoded = backend.decode(&jpeg_bytes(300, 200)).unwrap();
        let resized = backend
            .resize(
                &decoded,
                &ResizeParams {
                    width: 150,
                    height: 100,
                },
            )
            .unwrap();
        let out = backend
            .encode(
                &resized,
                &EncodeParams {
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(85),
                },
            )
            .unwrap();
        let reread = image::load_from_memory(&out).unwrap();
        assert_eq!((reread.width(), reread.height()), (150, 100));
    }
}
