// src/engine/pipeline.rs
//
// One file, one run: decode -> plan -> resample -> encode -> original display
// form. Any stage failure ends the run with that stage's error; a record is
// only assembled once every stage has succeeded.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};
use uuid::Uuid;

use crate::display::DataUrl;
use crate::engine::codec::{Codec, EncodedImage, ImageCodec};
use crate::engine::common::EngineResult;
use crate::engine::io::{SourceFile, SourceMeta};
use crate::engine::planner::{plan, Dimensions};
use crate::engine::resample::{FirResampler, Resampler};
use crate::error::ThumbnailError;
use crate::settings::{ThumbnailConfig, ThumbnailSpec};

/// Session-unique identifier of a processed image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    /// Mint a fresh id. Random v4 UUIDs, so concurrent completions within
    /// the same millisecond never collide.
    pub fn new() -> Self {
        Self(format!("img-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wall time spent in each stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub decode_ms: f64,
    pub resize_ms: f64,
    pub encode_ms: f64,
    pub display_ms: f64,
    pub total_ms: f64,
}

/// A successfully processed source file. Immutable once built.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub id: ImageId,
    pub source: SourceMeta,
    /// The untouched source file in displayable form.
    pub original: DataUrl,
    pub thumbnail: EncodedImage,
    pub thumbnail_display: DataUrl,
    pub thumbnail_dimensions: Dimensions,
    pub processing_time_ms: f64,
    pub thumbnail_byte_size: u64,
    pub timings: StageTimings,
}

/// Monotonic stage clock.
struct StageRecorder {
    start_total: Instant,
    stage_start: Instant,
    timings: StageTimings,
}

impl StageRecorder {
    fn start() -> Self {
        let now = Instant::now();
        Self {
            start_total: now,
            stage_start: now,
            timings: StageTimings::default(),
        }
    }

    fn lap(&mut self) -> f64 {
        let elapsed = self.stage_start.elapsed().as_secs_f64() * 1000.0;
        self.stage_start = Instant::now();
        elapsed
    }

    fn mark_decode_done(&mut self) {
        self.timings.decode_ms = self.lap();
    }

    fn mark_resize_done(&mut self) {
        self.timings.resize_ms = self.lap();
    }

    fn mark_encode_done(&mut self) {
        self.timings.encode_ms = self.lap();
    }

    fn mark_display_done(&mut self) {
        self.timings.display_ms = self.lap();
    }

    fn finish(mut self) -> StageTimings {
        self.timings.total_ms = self.start_total.elapsed().as_secs_f64() * 1000.0;
        self.timings
    }
}

/// Per-file thumbnail workflow over a codec and a resampler.
pub struct ThumbnailPipeline<C, R> {
    codec: C,
    resampler: R,
    config: ThumbnailConfig,
}

/// Pipeline over the built-in codec and resampler.
pub type DefaultPipeline = ThumbnailPipeline<ImageCodec, FirResampler>;

impl<C: Codec, R: Resampler> ThumbnailPipeline<C, R> {
    pub fn new(codec: C, resampler: R) -> Self {
        Self::with_config(codec, resampler, ThumbnailConfig::default())
    }

    pub fn with_config(codec: C, resampler: R, config: ThumbnailConfig) -> Self {
        Self {
            codec,
            resampler,
            config,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Process one file with the configured thumbnail spec.
    pub async fn process(&self, file: &SourceFile) -> EngineResult<ProcessedImage> {
        self.process_with_spec(file, self.config.spec).await
    }

    /// Process one file against an explicit spec.
    pub async fn process_with_spec(
        &self,
        file: &SourceFile,
        spec: ThumbnailSpec,
    ) -> EngineResult<ProcessedImage> {
        let mut recorder = StageRecorder::start();

        let source = self.codec.decode(file).await?;
        recorder.mark_decode_done();

        let (source_width, source_height) = source.dimensions();
        let target = plan(source_width, source_height, spec.max_edge());
        trace!(
            name = file.name(),
            source = %Dimensions::new(source_width, source_height),
            %target,
            "planned thumbnail"
        );

        let resized = self
            .resampler
            .resize(&source, target, &self.config.resample)
            .await?;
        if resized.dimensions() != (target.width, target.height) {
            return Err(ThumbnailError::resize_failed(
                source.dimensions(),
                (target.width, target.height),
                format!(
                    "resampler returned {}",
                    Dimensions::from(resized.dimensions())
                ),
            ));
        }
        drop(source);
        recorder.mark_resize_done();

        let thumbnail = self.codec.encode(&resized, self.config.output).await?;
        recorder.mark_encode_done();

        let original = self.codec.to_display(file).await?;
        recorder.mark_display_done();

        let timings = recorder.finish();
        let image = ProcessedImage {
            id: ImageId::new(),
            source: file.meta(),
            original,
            thumbnail_display: thumbnail.to_data_url(),
            thumbnail_dimensions: thumbnail.dimensions,
            processing_time_ms: timings.total_ms,
            thumbnail_byte_size: thumbnail.byte_size(),
            thumbnail,
            timings,
        };

        debug!(
            id = %image.id,
            name = %image.source.name,
            dimensions = %image.thumbnail_dimensions,
            bytes = image.thumbnail_byte_size,
            elapsed_ms = image.processing_time_ms,
            "thumbnail ready"
        );
        Ok(image)
    }
}

impl Default for DefaultPipeline {
    fn default() -> Self {
        Self::new(ImageCodec::new(), FirResampler::new())
    }
}

impl<C, R> fmt::Debug for ThumbnailPipeline<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Shared pipeline, as held by the batch coordinator.
pub type SharedPipeline<C, R> = Arc<ThumbnailPipeline<C, R>>;
