// lib.rs
//
// thumbnail-lab: concurrent thumbnail generation for a set of user-selected
// images, with the original and the thumbnail kept side by side for display.
//
// Design goals:
// - Every file is processed independently; one bad file never stops the rest
// - Results stream into the gallery in completion order
// - Decode, resample and encode never block the async scheduler
// - Codec and resampler are swappable behind traits

pub mod display;
pub mod engine;
pub mod error;
pub mod settings;

pub use display::{compression_ratio, format_file_size, CardView, CountLabel, DataUrl};
pub use engine::{
    plan, BatchCoordinator, Codec, DefaultPipeline, Dimensions, FirResampler, GalleryEvent,
    GalleryHandle, GalleryObserver, ImageCodec, ImageId, ProcessedImage, Resampler, SourceFile,
    ThumbnailPipeline, TracingObserver,
};
pub use error::{ErrorCategory, PipelineStage, ThumbnailError};
pub use settings::{OutputFormat, ResampleOptions, ThumbnailConfig, ThumbnailSpec};

/// Coordinator over the built-in codec and resampler.
pub type DefaultCoordinator = BatchCoordinator<ImageCodec, FirResampler>;

impl DefaultCoordinator {
    /// Coordinator with the default pipeline and logging observer.
    pub fn with_defaults() -> Self {
        Self::new(DefaultPipeline::default())
    }
}
