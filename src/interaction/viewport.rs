//! Screen to world conversion for pointer input

use crate::error::TrackError;
use crate::geometry::Point;

/// Canvas pan and zoom, plus the base pixels-per-millimetre factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen offset of the world origin, in pixels
    pub pan: Point,
    pub zoom: f64,
    pub scale_mm_to_px: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Point::zero(),
            zoom: 1.0,
            scale_mm_to_px: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(pan: Point, zoom: f64, scale_mm_to_px: f64) -> Result<Self, TrackError> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(TrackError::InvalidScale { scale: zoom });
        }
        if !(scale_mm_to_px.is_finite() && scale_mm_to_px > 0.0) {
            return Err(TrackError::InvalidScale {
                scale: scale_mm_to_px,
            });
        }
        if !pan.is_finite() {
            return Err(TrackError::invalid_argument("viewport pan must be finite"));
        }
        Ok(Self {
            pan,
            zoom,
            scale_mm_to_px,
        })
    }

    /// Canvas pixels to world pixels: `(screen - pan) / zoom`
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        (screen - self.pan) * (1.0 / self.zoom)
    }

    /// Canvas pixels to world millimetres
    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.screen_to_canvas(screen) * (1.0 / self.scale_mm_to_px)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        world * (self.scale_mm_to_px * self.zoom) + self.pan
    }

    /// Convert a screen distance (e.g. a hit tolerance) into millimetres
    pub fn screen_distance_to_world(&self, pixels: f64) -> f64 {
        pixels / (self.zoom * self.scale_mm_to_px)
    }
}
