// src/engine/gallery.rs
//
// Session gallery: processed images in the order they finished.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::pipeline::{ImageId, ProcessedImage};

/// Ordered collection of successfully processed images.
///
/// `append` and `clear` are the only mutators.
#[derive(Debug, Default)]
pub struct Gallery {
    images: Vec<Arc<ProcessedImage>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, image: Arc<ProcessedImage>) {
        self.images.push(image);
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn count(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, id: &ImageId) -> Option<&Arc<ProcessedImage>> {
        self.images.iter().find(|image| &image.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProcessedImage>> {
        self.images.iter()
    }

    pub fn snapshot(&self) -> Vec<Arc<ProcessedImage>> {
        self.images.clone()
    }
}

/// Read-only view of a gallery owned elsewhere.
#[derive(Debug, Clone)]
pub struct GalleryHandle {
    inner: Arc<RwLock<Gallery>>,
}

impl GalleryHandle {
    pub(crate) fn new(inner: Arc<RwLock<Gallery>>) -> Self {
        Self { inner }
    }

    pub fn count(&self) -> usize {
        self.inner.read().count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn get(&self, id: &ImageId) -> Option<Arc<ProcessedImage>> {
        self.inner.read().get(id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Arc<ProcessedImage>> {
        self.inner.read().snapshot()
    }
}
