// src/engine/planner.rs
//
// Aspect-preserving target dimensions. Pure arithmetic, no failure modes.

use std::fmt;

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Longer edge. Width wins ties.
    pub fn governing_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn is_landscape_or_square(&self) -> bool {
        self.width >= self.height
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Compute thumbnail dimensions for a source image.
///
/// The governing edge (width when `width >= height`, height otherwise) is
/// clamped to `min(max_edge, edge)`. The other edge is scaled by the same
/// ratio and rounded to the nearest pixel. Never upscales, never returns a
/// zero edge. Zero inputs are treated as 1.
pub fn plan(source_width: u32, source_height: u32, max_edge: u32) -> Dimensions {
    let source_width = source_width.max(1);
    let source_height = source_height.max(1);
    let max_edge = max_edge.max(1);

    if source_width >= source_height {
        let width = source_width.min(max_edge);
        let height = scale_minor(source_height, width, source_width);
        Dimensions::new(width, height)
    } else {
        let height = source_height.min(max_edge);
        let width = scale_minor(source_width, height, source_height);
        Dimensions::new(width, height)
    }
}

/// `minor * new_major / old_major`, rounded half away from zero, at least 1.
fn scale_minor(minor: u32, new_major: u32, old_major: u32) -> u32 {
    let ratio = new_major as f64 / old_major as f64;
    let scaled = (minor as f64 * ratio).round() as u32;
    scaled.clamp(1, new_major)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_is_width_governed() {
        assert_eq!(plan(800, 400, 400), Dimensions::new(400, 200));
        assert_eq!(plan(1000, 500, 400), Dimensions::new(400, 200));
    }

    #[test]
    fn portrait_is_height_governed() {
        assert_eq!(plan(400, 800, 400), Dimensions::new(200, 400));
        assert_eq!(plan(500, 1000, 400), Dimensions::new(200, 400));
    }

    #[test]
    fn square_sources() {
        assert_eq!(plan(500, 500, 400), Dimensions::new(400, 400));
        assert_eq!(plan(400, 400, 400), Dimensions::new(400, 400));
        assert_eq!(plan(300, 300, 400), Dimensions::new(300, 300));
    }

    #[test]
    fn small_sources_are_not_upscaled() {
        assert_eq!(plan(120, 80, 400), Dimensions::new(120, 80));
        assert_eq!(plan(1, 1, 400), Dimensions::new(1, 1));
    }

    #[test]
    fn rounding_goes_to_nearest() {
        // 101:51 at width 50 -> 25.247..
        assert_eq!(plan(101, 51, 50), Dimensions::new(50, 25));
        // 3:2 at width 400 from 1500 -> 266.67
        assert_eq!(plan(1500, 1000, 400), Dimensions::new(400, 267));
    }

    #[test]
    fn extreme_panorama_keeps_one_pixel_minor_edge() {
        assert_eq!(plan(10_000, 3, 400), Dimensions::new(400, 1));
        assert_eq!(plan(3, 10_000, 400), Dimensions::new(1, 400));
    }

    #[test]
    fn zero_inputs_are_clamped() {
        assert_eq!(plan(0, 0, 400), Dimensions::new(1, 1));
        assert_eq!(plan(800, 400, 0), Dimensions::new(1, 1));
    }

    #[test]
    fn governing_edge_prefers_width_on_ties() {
        let d = Dimensions::new(300, 300);
        assert!(d.is_landscape_or_square());
        assert_eq!(d.governing_edge(), 300);
        assert_eq!(d.to_string(), "300x300");
    }
}
