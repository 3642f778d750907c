//! Read-only scanner for embedded metadata blocks.
//!
//! Lists where EXIF, XMP, IPTC and ICC data sit inside a JPEG, PNG or WebP
//! byte stream without decoding any pixels:
//!
//! | Container | Where metadata lives |
//! |---|---|
//! | JPEG | APP1 `Exif\0\0` / APP1 XMP namespace / APP13 `Photoshop 3.0` / APP2 `ICC_PROFILE` |
//! | PNG | `eXIf`, `iCCP`, `iTXt`/`tEXt`/`zTXt` with XMP or raw-profile keywords |
//! | WebP | RIFF chunks `EXIF`, `XMP `, `ICCP` |
//!
//! Used by the `inspect` command and to check that processed artifacts leak
//! no camera or location data. Malformed input never panics; scanning stops
//! at the first structure that does not fit.

use super::params::OutputFormat;
use super::sniff::sniff_format;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKind {
    Exif,
    Xmp,
    Iptc,
    Icc,
}

impl MetadataKind {
    /// EXIF, XMP and IPTC can carry camera, author and GPS data; ICC is a
    /// colour profile only.
    pub fn is_private(self) -> bool {
        !matches!(self, Self::Icc)
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exif => "EXIF",
            Self::Xmp => "XMP",
            Self::Iptc => "IPTC",
            Self::Icc => "ICC",
        };
        f.write_str(name)
    }
}

/// One metadata block found in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetadataBlock {
    pub kind: MetadataKind,
    /// Byte offset of the block's payload.
    pub offset: usize,
    pub len: usize,
}

/// Scan an encoded image for metadata blocks.
///
/// Returns an empty list for formats other than JPEG/PNG/WebP.
pub fn scan_metadata(bytes: &[u8]) -> Vec<MetadataBlock> {
    match sniff_format(bytes) {
        Ok(OutputFormat::Jpeg) => scan_jpeg(bytes),
        Ok(OutputFormat::Png) => scan_png(bytes),
        Ok(OutputFormat::WebP) => scan_webp(bytes),
        Err(_) => Vec::new(),
    }
}

/// True if any block could leak camera/location/author data.
pub fn has_private_metadata(bytes: &[u8]) -> bool {
    scan_metadata(bytes).iter().any(|b| b.kind.is_private())
}

// ---------------------------------------------------------------------------
// JPEG: marker segments up to start-of-scan
// ---------------------------------------------------------------------------

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const XMP_NAMESPACE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const ICC_HEADER: &[u8] = b"ICC_PROFILE\0";

fn scan_jpeg(data: &[u8]) -> Vec<MetadataBlock> {
    let mut blocks = Vec::new();
    // Skip SOI
    let mut pos = 2;

    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS (0xDA) means entropy-coded data starts, EOI ends the stream
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        // Markers without length field
        if (0xD0..=0xD8).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 || pos + 2 + seg_len > data.len() {
            break;
        }
        let payload_start = pos + 4;
        let payload = &data[payload_start..pos + 2 + seg_len];

        let kind = match marker {
            0xE1 if payload.starts_with(EXIF_HEADER) => Some(MetadataKind::Exif),
            0xE1 if payload.starts_with(XMP_NAMESPACE) => Some(MetadataKind::Xmp),
            0xED if payload.starts_with(PHOTOSHOP_HEADER) => Some(MetadataKind::Iptc),
            0xE2 if payload.starts_with(ICC_HEADER) => Some(MetadataKind::Icc),
            _ => None,
        };
        if let Some(kind) = kind {
            blocks.push(MetadataBlock {
                kind,
                offset: payload_start,
                len: payload.len(),
            });
        }

        pos += 2 + seg_len;
    }

    blocks
}

// ---------------------------------------------------------------------------
// PNG: length-prefixed chunks after the 8-byte signature
// ---------------------------------------------------------------------------

fn scan_png(data: &[u8]) -> Vec<MetadataBlock> {
    let mut blocks = Vec::new();
    let mut pos = 8;

    while pos + 8 <= data.len() {
        let len = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        let chunk_type = &data[pos + 4..pos + 8];
        let payload_start = pos + 8;
        let Some(payload_end) = payload_start.checked_add(len) else {
            break;
        };
        if payload_end > data.len() {
            break;
        }
        let payload = &data[payload_start..payload_end];

        let kind = match chunk_type {
            b"eXIf" => Some(MetadataKind::Exif),
            b"iCCP" => Some(MetadataKind::Icc),
            b"iTXt" | b"tEXt" | b"zTXt" => png_text_kind(payload),
            _ => None,
        };
        if let Some(kind) = kind {
            blocks.push(MetadataBlock {
                kind,
                offset: payload_start,
                len,
            });
        }

        if chunk_type == b"IEND" {
            break;
        }
        // payload + CRC
        pos = payload_end + 4;
    }

    blocks
}

/// Classify a PNG text chunk by its keyword.
fn png_text_kind(payload: &[u8]) -> Option<MetadataKind> {
    let keyword_end = payload.iter().position(|&b| b == 0)?;
    match &payload[..keyword_end] {
        b"XML:com.adobe.xmp" => Some(MetadataKind::Xmp),
        b"Raw profile type exif" | b"Raw profile type APP1" => Some(MetadataKind::Exif),
        b"Raw profile type iptc" => Some(MetadataKind::Iptc),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// WebP: RIFF chunks, little-endian sizes, padded to even length
// ---------------------------------------------------------------------------

fn scan_webp(data: &[u8]) -> Vec<MetadataBlock> {
    let mut blocks = Vec::new();
    // "RIFF" size "WEBP"
    let mut pos = 12;

    while pos + 8 <= data.len() {
        let fourcc = &data[pos..pos + 4];
        let len = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        let payload_start = pos + 8;
        let Some(payload_end) = payload_start.checked_add(len) else {
            break;
        };
        if payload_end > data.len() {
            break;
        }

        let kind = match fourcc {
            b"EXIF" => Some(MetadataKind::Exif),
            b"XMP " => Some(MetadataKind::Xmp),
            b"ICCP" => Some(MetadataKind::Icc),
            _ => None,
        };
        if let Some(kind) = kind {
            blocks.push(MetadataBlock {
                kind,
                offset: payload_start,
                len,
            });
        }

        pos = payload_end + (len % 2);
    }

    blocks
}
