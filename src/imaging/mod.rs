//! Image processing on the pure Rust `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff** | `image::guess_format` on the leading bytes |
//! | **Decode + orientation** | `ImageReader` + `ImageDecoder::orientation` |
//! | **Resize** | `resize_exact` (Lanczos3, or Triangle on the basic backend) |
//! | **Encode** | JPEG / PNG encoders, lossy WebP via libwebp |
//! | **Metadata scan** | custom segment walker (JPEG markers, PNG chunks, RIFF chunks) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Sniffing / metadata**: byte-level inspection, no decoding
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`] and [`BasicBackend`]

pub mod backend;
pub mod basic_backend;
mod calculations;
pub mod metadata;
mod params;
pub mod rust_backend;
mod sniff;

pub use backend::{BackendError, Capabilities, DecodedImage, Dimensions, ImageBackend};
pub use basic_backend::BasicBackend;
pub use calculations::{constrain_to_width, needs_resize};
pub use params::{EncodeParams, OutputFormat, Quality, ResizeParams};
pub use rust_backend::RustBackend;
pub use sniff::{SniffError, sniff_format};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend to run with, as named in `config.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Full backend when a WebP encoder is compiled in, basic otherwise.
    #[default]
    Auto,
    Rust,
    Basic,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Rust => "rust",
            Self::Basic => "basic",
        })
    }
}

/// Pick the backend once, at startup.
///
/// The pipeline only ever sees the returned trait object and asks it for
/// [`Capabilities`]; nothing downstream matches on which backend this is.
pub fn select_backend(kind: BackendKind) -> Box<dyn ImageBackend> {
    let backend: Box<dyn ImageBackend> = match kind {
        BackendKind::Rust => Box::new(RustBackend::new()),
        BackendKind::Basic => Box::new(BasicBackend::new()),
        BackendKind::Auto if cfg!(feature = "webp") => Box::new(RustBackend::new()),
        BackendKind::Auto => Box::new(BasicBackend::new()),
    };
    tracing::debug!(
        requested = %kind,
        selected = backend.capabilities().name,
        "image backend selected"
    );
    backend
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_kinds_are_honoured() {
        assert_eq!(select_backend(BackendKind::Rust).capabilities().name, "rust");
        assert_eq!(select_backend(BackendKind::Basic).capabilities().name, "basic");
    }

    #[test]
    #[cfg(feature = "webp")]
    fn auto_prefers_webp_capable_backend() {
        let caps = select_backend(BackendKind::Auto).capabilities();
        assert_eq!(caps.name, "rust");
        assert!(caps.webp_encode);
    }

    #[test]
    #[cfg(not(feature = "webp"))]
    fn auto_falls_back_to_basic_without_webp() {
        assert_eq!(select_backend(BackendKind::Auto).capabilities().name, "basic");
    }

    #[test]
    fn backend_kind_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: BackendKind,
        }
        let parsed: Wrapper = toml::from_str(r#"kind = "basic""#).unwrap();
        assert_eq!(parsed.kind, BackendKind::Basic);
        assert!(toml::from_str::<Wrapper>(r#"kind = "magick""#).is_err());
    }
}
