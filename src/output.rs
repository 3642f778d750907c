//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every command leads with what happened (the artifact set, the detected
//! format, the backend in use) and follows with indented context lines for
//! paths and details, so the output reads as a report rather than a file
//! listing.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! Processed image/jpeg 2048x1365
//!     Original: uploads/20250301120000_a1b2c3d4e5f6.jpg
//!     Thumbnail: uploads/thumbs/20250301120000_a1b2c3d4e5f6.jpg (600x400)
//!     WebP: uploads/webp/20250301120000_a1b2c3d4e5f6.webp
//!     UUID: 6f1c…
//! ```
//!
//! ## Inspect
//!
//! ```text
//! photo.jpg
//!     Format: JPEG (image/jpeg)
//!     Size: 4000x3000
//!     EXIF: 12.4 KB at offset 6 (private)
//!     ICC: 3.1 KB at offset 12410
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::metadata::MetadataBlock;
use crate::imaging::{BackendKind, Capabilities, Dimensions, OutputFormat, SniffError};
use crate::upload::{ArtifactSet, UploadError};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn dimensions(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}

/// Byte count as B / KB / MB with one decimal.
fn byte_size(len: usize) -> String {
    const KB: f64 = 1024.0;
    let len_f = len as f64;
    if len_f < KB {
        format!("{len} B")
    } else if len_f < KB * KB {
        format!("{:.1} KB", len_f / KB)
    } else {
        format!("{:.1} MB", len_f / (KB * KB))
    }
}

// ============================================================================
// process
// ============================================================================

pub fn format_artifact_set(set: &ArtifactSet) -> Vec<String> {
    let mut lines = vec![format!(
        "Processed {} {}",
        set.mime_type,
        dimensions(set.width, set.height)
    )];
    lines.push(format!("{}Original: {}", indent(1), set.original_path));
    lines.push(format!(
        "{}Thumbnail: {} ({})",
        indent(1),
        set.thumbnail_path,
        dimensions(set.thumbnail_width, set.thumbnail_height)
    ));
    match &set.webp_path {
        Some(path) => lines.push(format!("{}WebP: {}", indent(1), path)),
        None => lines.push(format!("{}WebP: skipped", indent(1))),
    }
    lines.push(format!("{}UUID: {}", indent(1), set.uuid));
    lines
}

pub fn print_artifact_set(set: &ArtifactSet, picture_html: &str) {
    for line in format_artifact_set(set) {
        println!("{line}");
    }
    println!();
    println!("{picture_html}");
}

/// User-facing failure text, with the underlying cause on a second line for
/// server-side errors.
pub fn format_upload_error(err: &UploadError) -> Vec<String> {
    let mut lines = vec![err.user_message()];
    if !err.is_validation() {
        lines.push(format!("{}Cause: {}", indent(1), err));
    }
    lines
}

pub fn print_upload_error(err: &UploadError) {
    for line in format_upload_error(err) {
        eprintln!("{line}");
    }
}

// ============================================================================
// delete
// ============================================================================

pub fn format_delete_result(
    original: &str,
    thumbnail: &str,
    webp: Option<&str>,
    all_deleted: bool,
) -> Vec<String> {
    let mut lines = vec![if all_deleted {
        "Deleted artifact set".to_string()
    } else {
        "Some files could not be deleted (see log)".to_string()
    }];
    lines.push(format!("{}Original: {}", indent(1), original));
    lines.push(format!("{}Thumbnail: {}", indent(1), thumbnail));
    if let Some(webp) = webp {
        lines.push(format!("{}WebP: {}", indent(1), webp));
    }
    lines
}

pub fn print_delete_result(original: &str, thumbnail: &str, webp: Option<&str>, all_deleted: bool) {
    for line in format_delete_result(original, thumbnail, webp, all_deleted) {
        println!("{line}");
    }
}

// ============================================================================
// inspect
// ============================================================================

pub fn format_inspection(
    name: &str,
    format: &Result<OutputFormat, SniffError>,
    size: Option<Dimensions>,
    blocks: &[MetadataBlock],
) -> Vec<String> {
    let mut lines = vec![name.to_string()];
    match format {
        Ok(format) => lines.push(format!(
            "{}Format: {} ({})",
            indent(1),
            format,
            format.mime_type()
        )),
        Err(e) => {
            lines.push(format!("{}Format: {}", indent(1), e));
            return lines;
        }
    }
    if let Some(size) = size {
        lines.push(format!(
            "{}Size: {}",
            indent(1),
            dimensions(size.width, size.height)
        ));
    }
    if blocks.is_empty() {
        lines.push(format!("{}Metadata: none", indent(1)));
    }
    for block in blocks {
        let privacy = if block.kind.is_private() {
            " (private)"
        } else {
            ""
        };
        lines.push(format!(
            "{}{}: {} at offset {}{}",
            indent(1),
            block.kind,
            byte_size(block.len),
            block.offset,
            privacy
        ));
    }
    lines
}

pub fn print_inspection(
    name: &str,
    format: &Result<OutputFormat, SniffError>,
    size: Option<Dimensions>,
    blocks: &[MetadataBlock],
) {
    for line in format_inspection(name, format, size, blocks) {
        println!("{line}");
    }
}

// ============================================================================
// backend
// ============================================================================

pub fn format_backend(requested: BackendKind, capabilities: &Capabilities) -> Vec<String> {
    let encodes: Vec<String> = [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP]
        .into_iter()
        .filter(|f| capabilities.can_encode(*f))
        .map(|f| f.to_string())
        .collect();
    vec![
        format!("Backend: {} (requested: {})", capabilities.name, requested),
        format!("{}Encodes: {}", indent(1), encodes.join(", ")),
        format!(
            "{}WebP variants: {}",
            indent(1),
            if capabilities.webp_encode {
                "enabled"
            } else {
                "unavailable"
            }
        ),
    ]
}

pub fn print_backend(requested: BackendKind, capabilities: &Capabilities) {
    for line in format_backend(requested, capabilities) {
        println!("{line}");
    }
}
