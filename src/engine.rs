// src/engine.rs
//
// The core of thumbnail-lab. For every selected file:
// 1. Decode the bytes into a pixel surface (blocking pool)
// 2. Plan aspect-preserving target dimensions
// 3. Resample through the `Resampler` seam
// 4. Encode the thumbnail and a displayable form of the original
//
// The batch coordinator runs one such pipeline per file concurrently and
// appends results to the session gallery as they complete.
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod batch;
mod codec;
mod common;
mod decoder;
mod encoder;
mod gallery;
mod io;
mod pipeline;
mod planner;
mod resample;

pub use batch::{BatchCoordinator, GalleryEvent, GalleryObserver, TracingObserver};
pub use codec::{Codec, EncodedImage, ImageCodec, PixelSurface};
pub use common::{run_with_panic_policy, EngineResult};
pub use decoder::{check_dimensions, decode_image, detect_format, ensure_dimensions_safe};
pub use encoder::{encode, encode_jpeg, encode_png};
pub use gallery::{Gallery, GalleryHandle};
pub use io::{HandleTracker, SourceFile, SourceHandle, SourceMeta};
pub use pipeline::{DefaultPipeline, ImageId, ProcessedImage, StageTimings, ThumbnailPipeline};
pub use planner::{plan, Dimensions};
pub use resample::{apply_unsharp_mask, resample_image, FirResampler, Resampler};
