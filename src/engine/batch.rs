// src/engine/batch.rs
//
// Batch coordinator: every selected file gets its own task, all started at
// once. Outcomes are drained in completion order; successes are appended to
// the gallery and announced as they land, failures are reported and dropped.
// The batch is finished only when every task has settled.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::codec::Codec;
use crate::engine::gallery::{Gallery, GalleryHandle};
use crate::engine::io::{SourceFile, SourceMeta};
use crate::engine::pipeline::{ProcessedImage, SharedPipeline, ThumbnailPipeline};
use crate::engine::resample::Resampler;
use crate::error::ThumbnailError;

/// Receives gallery changes as they happen. Every method defaults to a no-op.
pub trait GalleryObserver: Send + Sync {
    /// A non-empty batch was accepted. Show a busy indicator.
    fn batch_started(&self, _total: usize) {}

    /// `image` was appended; `count` is the gallery size right after.
    fn image_ready(&self, _image: &Arc<ProcessedImage>, _count: usize) {}

    fn image_failed(&self, _source: &SourceMeta, _error: &ThumbnailError) {}

    /// Every task in the batch has settled.
    fn batch_finished(&self) {}

    /// The gallery was emptied. Drop rendered cards and reset the selection.
    fn cleared(&self) {}
}

/// Logs every gallery change.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl GalleryObserver for TracingObserver {
    fn batch_started(&self, total: usize) {
        info!(total, "processing batch");
    }

    fn image_ready(&self, image: &Arc<ProcessedImage>, count: usize) {
        info!(
            id = %image.id,
            name = %image.source.name,
            dimensions = %image.thumbnail_dimensions,
            elapsed_ms = image.processing_time_ms,
            count,
            "image added to gallery"
        );
    }

    fn image_failed(&self, source: &SourceMeta, error: &ThumbnailError) {
        warn!(
            name = %source.name,
            stage = ?error.stage(),
            error = %error,
            "image processing failed"
        );
    }

    fn batch_finished(&self) {
        info!("batch finished");
    }

    fn cleared(&self) {
        info!("gallery cleared");
    }
}

/// Gallery changes as values, for consumers that prefer a stream.
#[derive(Debug, Clone)]
pub enum GalleryEvent {
    BatchStarted { total: usize },
    ImageReady { image: Arc<ProcessedImage>, count: usize },
    ImageFailed { source: SourceMeta, error: ThumbnailError },
    BatchFinished,
    Cleared,
}

// A closed receiver just means nobody is listening anymore.
impl GalleryObserver for UnboundedSender<GalleryEvent> {
    fn batch_started(&self, total: usize) {
        let _ = self.send(GalleryEvent::BatchStarted { total });
    }

    fn image_ready(&self, image: &Arc<ProcessedImage>, count: usize) {
        let _ = self.send(GalleryEvent::ImageReady {
            image: Arc::clone(image),
            count,
        });
    }

    fn image_failed(&self, source: &SourceMeta, error: &ThumbnailError) {
        let _ = self.send(GalleryEvent::ImageFailed {
            source: source.clone(),
            error: error.clone(),
        });
    }

    fn batch_finished(&self) {
        let _ = self.send(GalleryEvent::BatchFinished);
    }

    fn cleared(&self) {
        let _ = self.send(GalleryEvent::Cleared);
    }
}

/// Session-scoped owner of the gallery and the pipeline that feeds it.
pub struct BatchCoordinator<C, R> {
    pipeline: SharedPipeline<C, R>,
    gallery: Arc<RwLock<Gallery>>,
    observer: Arc<dyn GalleryObserver>,
}

impl<C, R> BatchCoordinator<C, R>
where
    C: Codec + 'static,
    R: Resampler + 'static,
{
    pub fn new(pipeline: ThumbnailPipeline<C, R>) -> Self {
        Self::with_observer(pipeline, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        pipeline: ThumbnailPipeline<C, R>,
        observer: Arc<dyn GalleryObserver>,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            gallery: Arc::new(RwLock::new(Gallery::new())),
            observer,
        }
    }

    pub fn pipeline(&self) -> &ThumbnailPipeline<C, R> {
        &self.pipeline
    }

    /// Process every file concurrently and return once all have settled.
    ///
    /// An empty selection does nothing and emits no events.
    pub async fn run_batch(&self, files: Vec<SourceFile>) {
        if files.is_empty() {
            debug!("empty selection, nothing to process");
            return;
        }

        let total = files.len();
        self.observer.batch_started(total);

        let mut pending = PendingFiles::new(files.iter().map(SourceFile::meta).collect());
        let mut tasks = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            tasks.spawn(async move {
                let name = file.name().to_string();
                // A panic in the pipeline future stays inside the inner task
                // and comes back as this file's failure.
                let outcome = match tokio::spawn(async move { pipeline.process(&file).await }).await
                {
                    Ok(outcome) => outcome,
                    Err(join_error) => {
                        Err(ThumbnailError::file_task_aborted(name, join_error.to_string()))
                    }
                };
                (index, outcome)
            });
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut lost = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(settled) => settled,
                Err(join_error) => {
                    warn!(error = %join_error, "file task lost");
                    lost.push(join_error.to_string());
                    continue;
                }
            };
            let Some(meta) = pending.settle(index) else {
                warn!(index, "file settled twice");
                continue;
            };

            match outcome {
                Ok(image) => {
                    let image = Arc::new(image);
                    let count = {
                        let mut gallery = self.gallery.write();
                        gallery.append(Arc::clone(&image));
                        gallery.count()
                    };
                    succeeded += 1;
                    self.observer.image_ready(&image, count);
                }
                Err(error) => {
                    failed += 1;
                    self.observer.image_failed(&meta, &error);
                }
            }
        }

        // A task that died outside its inner spawn took its index with it;
        // whatever never settled is reported here.
        let reason = if lost.is_empty() {
            "task ended without an outcome".to_string()
        } else {
            lost.join("; ")
        };
        for meta in pending.into_unsettled() {
            failed += 1;
            let error = ThumbnailError::file_task_aborted(meta.name.clone(), reason.clone());
            self.observer.image_failed(&meta, &error);
        }

        debug!(total, succeeded, failed, "all file tasks settled");
        self.observer.batch_finished();
    }

    /// Empty the gallery and tell the display layer to reset.
    pub fn clear(&self) {
        self.gallery.write().clear();
        self.observer.cleared();
    }

    pub fn count(&self) -> usize {
        self.gallery.read().count()
    }

    /// Read-only view for the presentation layer.
    pub fn gallery(&self) -> GalleryHandle {
        GalleryHandle::new(Arc::clone(&self.gallery))
    }
}

/// Files of one batch that have not produced an outcome yet.
struct PendingFiles {
    slots: Vec<Option<SourceMeta>>,
}

impl PendingFiles {
    fn new(metas: Vec<SourceMeta>) -> Self {
        Self {
            slots: metas.into_iter().map(Some).collect(),
        }
    }

    /// Mark `index` as settled. `None` if it already was or never existed.
    fn settle(&mut self, index: usize) -> Option<SourceMeta> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    fn into_unsettled(self) -> impl Iterator<Item = SourceMeta> {
        self.slots.into_iter().flatten()
    }
}
