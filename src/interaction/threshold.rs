//! Click versus drag discrimination.

use crate::geometry::Point;

/// Pointer travel along either axis, in pixels, before a press becomes a drag
pub const DEFAULT_DRAG_THRESHOLD: f64 = 8.0;

/// Holds the press position until the pointer has moved far enough
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragThreshold {
    threshold: f64,
    start: Option<Point>,
}

impl Default for DragThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl DragThreshold {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start: None,
        }
    }

    /// Arm the helper at the press position
    pub fn begin_tracking(&mut self, start: Point) {
        self.start = Some(start);
    }

    /// True once the pointer moved more than the threshold on either axis.
    ///
    /// Always false while disarmed.
    pub fn should_start_drag(&self, current: Point) -> bool {
        match self.start {
            Some(start) => {
                (current.x - start.x).abs() > self.threshold
                    || (current.y - start.y).abs() > self.threshold
            }
            None => false,
        }
    }

    /// Disarm, after a drag started or the press ended as a click
    pub fn reset(&mut self) {
        self.start = None;
    }

    pub fn is_waiting(&self) -> bool {
        self.start.is_some()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}
