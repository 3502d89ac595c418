// src/engine/io.rs
//
// Input side of the codec adapter: the caller's source file and the scoped
// handles the adapter takes on it while decoding or converting it for display.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::trace;

/// A user-selected file: an immutable blob with a name and a MIME type.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, Debug)]
pub struct SourceFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type as reported by the selection control. May be empty.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn meta(&self) -> SourceMeta {
        SourceMeta {
            name: self.name.clone(),
            byte_size: self.byte_size(),
        }
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }
}

/// Metadata about a source file that outlives the pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceMeta {
    pub name: String,
    pub byte_size: u64,
}

/// Counts temporary handles taken on source files.
///
/// Every decode and every display conversion holds a [`SourceHandle`] for its
/// duration. Handles are released on drop, so a run that bails out early with
/// `?` releases exactly like one that succeeds.
#[derive(Debug, Default)]
pub struct HandleTracker {
    live: AtomicUsize,
    acquired: AtomicU64,
}

impl HandleTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn acquire(self: &Arc<Self>, file: &SourceFile) -> SourceHandle {
        self.live.fetch_add(1, Ordering::AcqRel);
        let serial = self.acquired.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(name = file.name(), serial, "acquired source handle");
        SourceHandle {
            tracker: Arc::clone(self),
            bytes: file.shared_bytes(),
            serial,
        }
    }

    /// Handles currently held.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Handles ever issued.
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Acquire)
    }
}

/// Scoped access to a source file's bytes. Released on drop.
#[derive(Debug)]
pub struct SourceHandle {
    tracker: Arc<HandleTracker>,
    bytes: Arc<[u8]>,
    serial: u64,
}

impl SourceHandle {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.tracker.live.fetch_sub(1, Ordering::AcqRel);
        trace!(serial = self.serial, "released source handle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_meta() {
        let file = SourceFile::new("cat.png", "image/png", vec![1u8, 2, 3]);
        assert_eq!(file.byte_size(), 3);
        assert_eq!(
            file.meta(),
            SourceMeta {
                name: "cat.png".to_string(),
                byte_size: 3
            }
        );
        assert!(!file.is_empty());
    }

    #[test]
    fn handles_release_on_drop() {
        let tracker = HandleTracker::new();
        let file = SourceFile::new("a.jpg", "image/jpeg", vec![0u8; 4]);

        let first = tracker.acquire(&file);
        let second = tracker.acquire(&file);
        assert_eq!(tracker.live(), 2);
        assert_eq!(first.bytes().len(), 4);
        assert_ne!(first.serial(), second.serial());

        drop(first);
        assert_eq!(tracker.live(), 1);
        drop(second);
        assert_eq!(tracker.live(), 0);
        assert_eq!(tracker.acquired(), 2);
    }

    #[test]
    fn handle_released_on_early_return() {
        fn fails(tracker: &Arc<HandleTracker>, file: &SourceFile) -> Result<(), &'static str> {
            let _handle = tracker.acquire(file);
            Err("decode failed")
        }

        let tracker = HandleTracker::new();
        let file = SourceFile::new("broken.bin", "", vec![0u8]);
        assert!(fails(&tracker, &file).is_err());
        assert_eq!(tracker.live(), 0);
        assert_eq!(tracker.acquired(), 1);
    }
}
