//! Content sniffing: decide what an upload *is* from its bytes.
//!
//! The client-supplied filename extension and MIME type are advisory only.
//! [`sniff_format`] inspects the leading magic bytes via
//! [`image::guess_format`] and admits exactly three formats:
//!
//! | Magic | Format |
//! |---|---|
//! | `FF D8 FF` | JPEG |
//! | `89 50 4E 47 0D 0A 1A 0A` | PNG |
//! | `RIFF....WEBP` | WebP |
//!
//! Anything else the `image` crate recognises (GIF, BMP, TIFF, ...) is
//! reported by name so the user learns *why* the upload was refused; bytes
//! that match no image signature at all are "not an image".

use super::params::OutputFormat;
use image::ImageFormat;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SniffError {
    #[error("file is not an image")]
    NotAnImage,
    #[error("{0} images are not supported")]
    UnsupportedFormat(String),
}

/// Sniff the image format of `bytes`.
pub fn sniff_format(bytes: &[u8]) -> Result<OutputFormat, SniffError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok(OutputFormat::Jpeg),
        Ok(ImageFormat::Png) => Ok(OutputFormat::Png),
        Ok(ImageFormat::WebP) => Ok(OutputFormat::WebP),
        Ok(other) => Err(SniffError::UnsupportedFormat(format_name(other))),
        Err(_) => Err(SniffError::NotAnImage),
    }
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_uppercase())
        .unwrap_or_else(|| format!("{format:?}").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_jpeg() {
        assert_eq!(
            sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            Ok(OutputFormat::Jpeg)
        );
    }

    #[test]
    fn detects_png() {
        assert_eq!(
            sniff_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Ok(OutputFormat::Png)
        );
    }

    #[test]
    fn detects_webp() {
        assert_eq!(
            sniff_format(b"RIFF\x24\x00\x00\x00WEBPVP8 "),
            Ok(OutputFormat::WebP)
        );
    }

    #[test]
    fn text_is_not_an_image() {
        assert_eq!(
            sniff_format(b"just some notes, saved as photo.jpg"),
            Err(SniffError::NotAnImage)
        );
    }

    #[test]
    fn empty_is_not_an_image() {
        assert_eq!(sniff_format(&[]), Err(SniffError::NotAnImage));
    }

    #[test]
    fn gif_is_recognised_but_refused() {
        let result = sniff_format(b"GIF89a\x01\x00\x01\x00\x00\x00\x00");
        assert_eq!(result, Err(SniffError::UnsupportedFormat("GIF".into())));
    }

    #[test]
    fn riff_without_webp_tag_is_not_webp() {
        // RIFF container holding WAVE audio
        assert_ne!(
            sniff_format(b"RIFF\x24\x00\x00\x00WAVEfmt "),
            Ok(OutputFormat::WebP)
        );
    }
}
