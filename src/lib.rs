//! # Artfolio
//!
//! Image upload pipeline for an artist portfolio site. An admin uploads a
//! photograph of an artwork; Artfolio turns that single untrusted file into a
//! normalized, web-ready artifact set and keeps the files on disk in step with
//! the artwork records that reference them.
//!
//! # Pipeline
//!
//! ```text
//! upload ─► validate ─► decode ─► orient ─► strip ─► resize ─► thumbnail ─► encode ─► persist
//!           status      sniffed    EXIF      EXIF/     max_width  from main    in memory   all or
//!           size        type       tag       XMP/IPTC                          first       nothing
//! ```
//!
//! The result is an [`upload::ArtifactSet`]: the main image, a thumbnail and,
//! when the backend can encode it, a WebP variant. All three share one fresh
//! random filename stem across three parallel directories under the public
//! root.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Backend trait, `image`-crate backends, content sniffing, metadata scanning, dimension maths |
//! | [`upload`] | The pipeline: validation, processing, all-or-nothing persistence, deletion |
//! | [`artwork`] | Artwork records, form validation, slugs, and the file lifecycle around create/update/delete |
//! | [`storage`] | Directory layout, filename allocation, path resolution |
//! | [`settings`] | Site settings collaborator (`max_upload_size`) |
//! | [`config`] | `config.toml` loading over stock defaults, validation |
//! | [`render`] | `<picture>` markup with Maud |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Bytes Decide the Type
//!
//! The client's filename and MIME type are never trusted. The format is
//! sniffed from magic bytes and the output keeps it: JPEG stays JPEG, PNG
//! stays PNG with its transparency. A `.jpg` that is really a text file is
//! rejected before anything is decoded.
//!
//! ## Backends Are Chosen Once
//!
//! [`imaging::select_backend`] picks a backend at startup. The pipeline only
//! asks it for [`imaging::Capabilities`], so a backend without a WebP encoder
//! simply produces sets without a WebP variant.
//!
//! ## Encode First, Then Write
//!
//! Every artifact is encoded in memory before the first byte hits disk, and
//! the writes are tracked by an [`upload::ArtifactGuard`]. An upload either
//! leaves a complete set or nothing.
//!
//! ## Two Kinds of Failure
//!
//! [`upload::ValidationError`] is the client's fault and carries a message
//! fit for the admin UI. [`upload::EncodingError`] is ours: the user sees a
//! generic message and the detail goes to the log.

pub mod artwork;
pub mod config;
pub mod imaging;
pub mod output;
pub mod render;
pub mod settings;
pub mod storage;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
