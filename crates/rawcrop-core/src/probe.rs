//! Client-side probe of RAW source metadata.
//!
//! NEF, CR2, ARW and DNG are all TIFF-based containers, so a quick EXIF read
//! yields the sensor output size and camera identity without decoding pixels.
//! The probe is best-effort: the view can still report the preview's natural
//! size when the container does not carry pixel dimensions.

use std::io::Cursor;

use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::SourceDimensions;

// TIFF constants
const TIFF_MAGIC_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00]; // II + 42
const TIFF_MAGIC_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A]; // MM + 42

/// Probe failures. None of them block an upload.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The bytes are not a TIFF-based container.
    #[error("Not a TIFF-based RAW container")]
    NotTiff,

    /// The EXIF block could not be read.
    #[error("Failed to read EXIF: {0}")]
    Exif(String),
}

/// Camera identity from the source EXIF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub make: String,
    pub model: String,
}

/// Metadata probed from a RAW source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub dimensions: Option<SourceDimensions>,
    pub camera: Option<CameraInfo>,
}

/// Check whether the bytes start with a TIFF header.
pub fn is_tiff_container(bytes: &[u8]) -> bool {
    if bytes.len() < 4 {
        return false;
    }
    bytes[..4] == TIFF_MAGIC_LE || bytes[..4] == TIFF_MAGIC_BE
}

/// Read source dimensions and camera identity from RAW bytes.
pub fn probe_source(bytes: &[u8]) -> Result<SourceInfo, ProbeError> {
    if !is_tiff_container(bytes) {
        return Err(ProbeError::NotTiff);
    }

    let mut cursor = Cursor::new(bytes);
    let exif = Reader::new()
        .read_from_container(&mut cursor)
        .map_err(|e| ProbeError::Exif(e.to_string()))?;

    let uint = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
    };
    let text = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| ascii_value(&f.value))
    };

    let dimensions = match (uint(Tag::PixelXDimension), uint(Tag::PixelYDimension)) {
        (Some(w), Some(h)) => SourceDimensions::new(w, h),
        _ => None,
    };

    let camera = match (text(Tag::Make), text(Tag::Model)) {
        (None, None) => None,
        (make, model) => Some(CameraInfo {
            make: make.unwrap_or_default(),
            model: model.unwrap_or_default(),
        }),
    };

    Ok(SourceInfo { dimensions, camera })
}

/// First string of an ASCII value, trimmed of padding.
fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts.first().and_then(|raw| {
            let s = String::from_utf8_lossy(raw);
            let s = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }),
        _ => None,
    }
}

#[cfg(test)]
fn entry(buf: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: u32) {
    buf.extend_from_slice(&tag.to_le_bytes());
    buf.extend_from_slice(&typ.to_le_bytes());
    buf.extend_from_slice(&count.to_le_bytes());
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Minimal little-endian TIFF with Make, Model and an Exif IFD holding
/// PixelXDimension/PixelYDimension.
#[cfg(test)]
pub(crate) fn tiff_with_exif(width: u16, height: u16) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&TIFF_MAGIC_LE);
    buf.extend_from_slice(&8u32.to_le_bytes());

    // IFD0 at 8: 3 entries -> ends at 8 + 2 + 36 + 4 = 50
    buf.extend_from_slice(&3u16.to_le_bytes());
    entry(&mut buf, 0x010F, 2, 6, 50); // Make
    entry(&mut buf, 0x0110, 2, 5, 56); // Model
    entry(&mut buf, 0x8769, 4, 1, 62); // ExifIFDPointer
    buf.extend_from_slice(&0u32.to_le_bytes());

    buf.extend_from_slice(b"Nikon\0"); // 50..56
    buf.extend_from_slice(b"D850\0"); // 56..61
    buf.push(0); // pad to 62

    // Exif IFD at 62
    buf.extend_from_slice(&2u16.to_le_bytes());
    entry(&mut buf, 0xA002, 3, 1, width as u32);
    entry(&mut buf, 0xA003, 3, 1, height as u32);
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf
}
