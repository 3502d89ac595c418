// src/engine/common.rs
//
// Common utilities shared across engine modules.
// Panic containment for codec/resampler work and the bridge from async code
// onto tokio's blocking pool.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::error::{PipelineStage, ThumbnailError};

pub type EngineResult<T> = std::result::Result<T, ThumbnailError>;

/// Run codec work, turning a panic into a stage-tagged error.
///
/// Decoders and encoders are fed untrusted bytes; a panic in one of them must
/// fail only the file being processed.
pub fn run_with_panic_policy<T, F>(stage: PipelineStage, context: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%stage, context, %message, "recovered from panic in codec work");
            Err(ThumbnailError::task_failed(
                stage,
                format!("{context}: panicked: {message}"),
            ))
        }
    }
}

/// Run CPU-bound work on the blocking pool and wait for it without blocking
/// the async scheduler.
pub async fn run_blocking<T, F>(stage: PipelineStage, context: &'static str, f: F) -> EngineResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> EngineResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || run_with_panic_policy(stage, context, f))
        .await
        .map_err(|e| ThumbnailError::task_failed(stage, format!("{context}: {e}")))?
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_becomes_task_failed() {
        let result: EngineResult<()> =
            run_with_panic_policy(PipelineStage::Encode, "encode:test", || panic!("kaboom"));
        let err = result.unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Encode));
        assert!(err.to_string().contains("kaboom"));
    }

    #[test]
    fn errors_pass_through_untouched() {
        let result: EngineResult<()> = run_with_panic_policy(PipelineStage::Decode, "decode:test", || {
            Err(ThumbnailError::corrupted_image())
        });
        assert!(matches!(result, Err(ThumbnailError::CorruptedImage)));
    }

    #[tokio::test]
    async fn run_blocking_returns_value() {
        let value = run_blocking(PipelineStage::Resample, "resample:test", || Ok(21 * 2))
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn run_blocking_contains_panics() {
        let result: EngineResult<u8> =
            run_blocking(PipelineStage::Resample, "resample:test", || panic!("worker died")).await;
        assert_eq!(result.unwrap_err().stage(), Some(PipelineStage::Resample));
    }
}
