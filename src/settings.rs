// src/settings.rs
//
// Run configuration. Cheap value types; nothing here does work.
//
// The only tunable a caller is expected to touch is the maximum thumbnail
// edge. Resample and encode parameters have fixed defaults and are only
// overridden by tests and benchmarks.

use std::num::NonZeroU32;

use crate::error::ThumbnailError;

/// Default maximum thumbnail edge in pixels.
pub const DEFAULT_MAX_EDGE: u32 = 400;

const DEFAULT_SPEC_EDGE: NonZeroU32 = match NonZeroU32::new(DEFAULT_MAX_EDGE) {
    Some(edge) => edge,
    None => panic!("DEFAULT_MAX_EDGE must be non-zero"),
};

/// Default thumbnail encode quality on the 0.0-1.0 scale.
pub const DEFAULT_THUMBNAIL_QUALITY: f32 = 0.9;

/// MIME type of generated thumbnails.
pub const THUMBNAIL_MIME: &str = "image/jpeg";

/// Bound on the thumbnail's governing (longer) edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    max_edge: NonZeroU32,
}

impl ThumbnailSpec {
    pub fn new(max_edge: u32) -> Result<Self, ThumbnailError> {
        NonZeroU32::new(max_edge)
            .map(|max_edge| Self { max_edge })
            .ok_or_else(|| {
                ThumbnailError::invalid_argument(
                    "max_edge",
                    max_edge.to_string(),
                    "Thumbnail edge must be a positive number of pixels",
                )
            })
    }

    pub fn max_edge(&self) -> u32 {
        self.max_edge.get()
    }
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_SPEC_EDGE,
        }
    }
}

/// Resampling filter quality on a 0-3 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleQuality {
    /// 0 - box filter, fastest
    Box,
    /// 1 - hamming
    Hamming,
    /// 2 - lanczos, 2 lobes
    Lanczos2,
    /// 3 - lanczos, 3 lobes
    Lanczos3,
}

impl ResampleQuality {
    pub fn from_level(level: u8) -> Result<Self, ThumbnailError> {
        match level {
            0 => Ok(Self::Box),
            1 => Ok(Self::Hamming),
            2 => Ok(Self::Lanczos2),
            3 => Ok(Self::Lanczos3),
            other => Err(ThumbnailError::invalid_argument(
                "quality",
                other.to_string(),
                "Expected a level between 0 and 3",
            )),
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Self::Box => 0,
            Self::Hamming => 1,
            Self::Lanczos2 => 2,
            Self::Lanczos3 => 3,
        }
    }
}

/// Unsharp mask applied after downsampling.
///
/// `amount` is a percentage of the high-frequency detail added back,
/// `radius` is the gaussian sigma of the blur, `threshold` is the minimum
/// per-channel difference (0-255) that gets sharpened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpMask {
    pub amount: u32,
    pub radius: f32,
    pub threshold: u8,
}

impl UnsharpMask {
    pub fn is_enabled(&self) -> bool {
        self.amount > 0 && self.radius > 0.0
    }
}

impl Default for UnsharpMask {
    fn default() -> Self {
        Self {
            amount: 80,
            radius: 0.6,
            threshold: 2,
        }
    }
}

/// Options passed to the resampler on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleOptions {
    pub quality: ResampleQuality,
    /// Keep the alpha channel. When off, the surface is flattened to RGB.
    pub alpha: bool,
    pub unsharp: UnsharpMask,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            quality: ResampleQuality::Lanczos3,
            alpha: true,
            unsharp: UnsharpMask::default(),
        }
    }
}

/// Output format for encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JPEG with quality 0-100
    Jpeg { quality: u8 },
    /// Lossless PNG
    Png,
}

impl OutputFormat {
    /// Resolve a MIME type and a 0.0-1.0 quality into an encoder format.
    ///
    /// Quality is clamped into range; PNG ignores it. Unknown MIME types are
    /// rejected.
    pub fn from_mime(mime: &str, quality: f32) -> Result<Self, ThumbnailError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg {
                quality: quality_to_percent(quality),
            }),
            "image/png" => Ok(Self::Png),
            other => Err(ThumbnailError::encode_failed(
                other.to_string(),
                "unsupported output MIME type",
            )),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpeg",
            Self::Png => "png",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: quality_to_percent(DEFAULT_THUMBNAIL_QUALITY),
        }
    }
}

fn quality_to_percent(quality: f32) -> u8 {
    if quality.is_nan() {
        return quality_to_percent(DEFAULT_THUMBNAIL_QUALITY);
    }
    (quality.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Complete configuration of one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThumbnailConfig {
    pub spec: ThumbnailSpec,
    pub resample: ResampleOptions,
    pub output: OutputFormat,
}

impl ThumbnailConfig {
    pub fn with_max_edge(mut self, max_edge: u32) -> Result<Self, ThumbnailError> {
        self.spec = ThumbnailSpec::new(max_edge)?;
        Ok(self)
    }

    pub fn with_resample(mut self, resample: ResampleOptions) -> Self {
        self.resample = resample;
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }
}
