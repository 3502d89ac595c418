// src/display.rs
//
// Presentation projection of gallery state. Rendering itself belongs to the
// caller; this module only shapes data for it.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::engine::{ImageId, ProcessedImage};

/// A `data:` URL that a browser-like surface can display directly.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime_type};base64,{}", BASE64.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or_default()
    }

    /// Decode the payload back into bytes.
    pub fn decode(&self) -> Option<Vec<u8>> {
        let (_, payload) = self.0.split_once(";base64,")?;
        BASE64.decode(payload).ok()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// Payloads are large; print only the header.
impl fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataUrl({}, {} chars)", self.mime_type(), self.0.len())
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable byte size: 1024-based, up to two decimals, trailing zeros
/// dropped. `0` prints as `0 B`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Percentage of bytes saved by the thumbnail relative to the original.
///
/// Negative when the thumbnail is larger. Zero for an empty original.
pub fn compression_ratio(original_bytes: u64, thumbnail_bytes: u64) -> f64 {
    if original_bytes == 0 {
        return 0.0;
    }
    (1.0 - thumbnail_bytes as f64 / original_bytes as f64) * 100.0
}

/// Everything a card needs to show one processed image side by side with
/// its original.
#[derive(Debug, Clone)]
pub struct CardView {
    pub id: ImageId,
    pub name: String,
    pub original: DataUrl,
    pub thumbnail: DataUrl,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub processing_time_ms: f64,
    pub original_byte_size: u64,
    pub thumbnail_byte_size: u64,
}

impl CardView {
    pub fn from_image(image: &ProcessedImage) -> Self {
        Self {
            id: image.id.clone(),
            name: image.source.name.clone(),
            original: image.original.clone(),
            thumbnail: image.thumbnail_display.clone(),
            thumbnail_width: image.thumbnail_dimensions.width,
            thumbnail_height: image.thumbnail_dimensions.height,
            processing_time_ms: image.processing_time_ms,
            original_byte_size: image.source.byte_size,
            thumbnail_byte_size: image.thumbnail_byte_size,
        }
    }

    pub fn original_size_label(&self) -> String {
        format_file_size(self.original_byte_size)
    }

    pub fn thumbnail_size_label(&self) -> String {
        format_file_size(self.thumbnail_byte_size)
    }

    pub fn time_label(&self) -> String {
        format!("{:.2} ms", self.processing_time_ms)
    }

    pub fn compression_label(&self) -> String {
        format!(
            "{:.1}%",
            compression_ratio(self.original_byte_size, self.thumbnail_byte_size)
        )
    }
}

/// Gallery count text and whether the clear action is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountLabel {
    pub text: String,
    pub clear_enabled: bool,
}

impl CountLabel {
    pub fn for_count(count: usize) -> Self {
        let text = match count {
            0 => "No images selected".to_string(),
            1 => "1 image selected".to_string(),
            n => format!("{n} images selected"),
        };
        Self {
            text,
            clear_enabled: count > 0,
        }
    }
}
