//! Viewport geometry and scroll anchoring
//!
//! Prepending older messages grows the content above the visible area. The
//! anchor keeps whatever the user is looking at in place:
//!
//! 1. `ScrollAnchor::capture` before the store is mutated
//! 2. mutate the store
//! 3. lay out and measure the new content height
//! 4. `ScrollAnchor::resolve` with that height to get the new offset

use serde::{Deserialize, Serialize};

/// Last known viewport geometry, in layout units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Distance scrolled from the top of the content
    pub offset: f64,
    /// Total scrollable content height
    pub content_height: f64,
    /// Height of the visible area
    pub viewport_height: f64,
}

impl Viewport {
    /// Create a viewport
    pub fn new(offset: f64, content_height: f64, viewport_height: f64) -> Self {
        Self {
            offset,
            content_height,
            viewport_height,
        }
    }

    /// Largest valid offset
    pub fn max_offset(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    /// Remaining distance to the bottom of the content
    pub fn distance_from_bottom(&self) -> f64 {
        (self.max_offset() - self.offset).max(0.0)
    }

    /// Whether the bottom edge is within `threshold` units
    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.distance_from_bottom() <= threshold
    }

    /// Whether the top edge is within `threshold` units
    pub fn is_near_top(&self, threshold: f64) -> bool {
        self.offset <= threshold
    }

    /// Move to the bottom of the current content
    pub fn pin_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }
}

/// Height and offset captured before a prepend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    offset_before: f64,
    height_before: f64,
}

impl ScrollAnchor {
    /// Capture the viewport before mutating the store
    pub fn capture(viewport: &Viewport) -> Self {
        Self {
            offset_before: viewport.offset,
            height_before: viewport.content_height,
        }
    }

    /// Offset that keeps the previously visible content in place
    pub fn resolve(&self, height_after: f64) -> f64 {
        (self.offset_before + (height_after - self.height_before)).max(0.0)
    }

    /// Height grown since capture
    pub fn delta(&self, height_after: f64) -> f64 {
        height_after - self.height_before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_shifts_by_height_delta() {
        let viewport = Viewport::new(40.0, 1000.0, 300.0);
        let anchor = ScrollAnchor::capture(&viewport);

        assert_eq!(anchor.resolve(1600.0), 640.0);
        assert_eq!(anchor.delta(1600.0), 600.0);
    }

    #[test]
    fn test_resolve_at_top_keeps_first_message_visible() {
        let viewport = Viewport::new(0.0, 500.0, 300.0);
        let anchor = ScrollAnchor::capture(&viewport);

        // 250 units of history were inserted above
        assert_eq!(anchor.resolve(750.0), 250.0);
    }

    #[test]
    fn test_resolve_never_negative() {
        let viewport = Viewport::new(10.0, 500.0, 300.0);
        let anchor = ScrollAnchor::capture(&viewport);

        assert_eq!(anchor.resolve(200.0), 0.0);
    }

    #[test]
    fn test_viewport_bottom_distance() {
        let mut viewport = Viewport::new(600.0, 1000.0, 300.0);
        assert_eq!(viewport.distance_from_bottom(), 100.0);
        assert!(viewport.is_near_bottom(100.0));
        assert!(!viewport.is_near_bottom(99.0));

        viewport.pin_to_bottom();
        assert_eq!(viewport.offset, 700.0);
        assert_eq!(viewport.distance_from_bottom(), 0.0);
    }

    #[test]
    fn test_short_content_is_always_at_bottom() {
        let viewport = Viewport::new(0.0, 100.0, 300.0);
        assert_eq!(viewport.max_offset(), 0.0);
        assert!(viewport.is_near_bottom(0.0));
        assert!(viewport.is_near_top(0.0));
    }
}
