// src/error.rs
//
// Unified error handling for thumbnail-lab
// Uses thiserror for simple, type-safe error handling
//
// Every failure a single file can hit is classified by the pipeline stage that
// produced it (decode, resample, encode). The coordinator reports the error as
// that file's outcome; it never reaches sibling files.

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Pipeline stage that produced an error.
///
/// These are the three failure kinds a file can have: a `Decode` error means
/// the input was unreadable or unsupported, `Resample` means the resize stage
/// failed, `Encode` means compression or display conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Decode,
    Resample,
    Encode,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Resample => "resample",
            Self::Encode => "encode",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error taxonomy for callers that want coarse handling
///
/// - UserError: Invalid input or configuration, recoverable by user
/// - CodecError: Format/encoding/resampling issues
/// - ResourceLimit: Dimension limits
/// - InternalBug: Library bugs (should not happen)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Format/encoding issues
    CodecError,
    /// Memory/dimension limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

/// thumbnail-lab error types
#[derive(Debug, Clone, Error)]
pub enum ThumbnailError {
    // Decode Errors
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Corrupted image data")]
    CorruptedImage,

    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Resample Errors
    #[error("Invalid resize dimensions: width={width}, height={height}")]
    InvalidResizeDimensions { width: u32, height: u32 },

    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    // Encode Errors
    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Worker Errors
    #[error("{stage} task failed: {message}")]
    TaskFailed {
        stage: PipelineStage,
        message: Cow<'static, str>,
    },

    #[error("Processing task for {name} ended abnormally: {message}")]
    FileTaskAborted {
        name: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Configuration Errors
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },
}

impl ThumbnailError {
    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn corrupted_image() -> Self {
        Self::CorruptedImage
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn invalid_resize_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidResizeDimensions { width, height }
    }

    pub fn resize_failed(
        source: (u32, u32),
        target: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source.0,
            source_height: source.1,
            target_width: target.0,
            target_height: target.1,
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn task_failed(stage: PipelineStage, message: impl Into<Cow<'static, str>>) -> Self {
        Self::TaskFailed {
            stage,
            message: message.into(),
        }
    }

    pub fn file_task_aborted(
        name: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::FileTaskAborted {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Pipeline stage that produced this error, if any.
    ///
    /// Configuration errors happen before a pipeline runs and have no stage.
    /// Neither does a file task that died outside any stage.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::UnsupportedFormat { .. }
            | Self::DecodeFailed { .. }
            | Self::CorruptedImage
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. } => Some(PipelineStage::Decode),

            Self::InvalidResizeDimensions { .. } | Self::ResizeFailed { .. } => {
                Some(PipelineStage::Resample)
            }

            Self::EncodeFailed { .. } => Some(PipelineStage::Encode),

            Self::TaskFailed { stage, .. } => Some(*stage),

            Self::FileTaskAborted { .. } | Self::InvalidArgument { .. } => None,
        }
    }

    pub fn is_decode_error(&self) -> bool {
        self.stage() == Some(PipelineStage::Decode)
    }

    pub fn is_resample_error(&self) -> bool {
        self.stage() == Some(PipelineStage::Resample)
    }

    pub fn is_encode_error(&self) -> bool {
        self.stage() == Some(PipelineStage::Encode)
    }

    /// Check if this error is recoverable (user can fix it)
    ///
    /// Consistent with category():
    /// - UserError and ResourceLimit errors are recoverable
    /// - CodecError and InternalBug errors are not
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidResizeDimensions { .. } | Self::InvalidArgument { .. } => {
                ErrorCategory::UserError
            }

            Self::UnsupportedFormat { .. }
            | Self::DecodeFailed { .. }
            | Self::CorruptedImage
            | Self::EncodeFailed { .. }
            | Self::ResizeFailed { .. } => ErrorCategory::CodecError,

            Self::DimensionExceedsLimit { .. } | Self::PixelCountExceedsLimit { .. } => {
                ErrorCategory::ResourceLimit
            }

            Self::TaskFailed { .. } | Self::FileTaskAborted { .. } => ErrorCategory::InternalBug,
        }
    }
}
