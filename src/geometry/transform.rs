//! Coordinate transforms from a segment's local frame into the world.
//!
//! ## Rotation Convention
//!
//! Rotation uses the screen convention: y points down and positive angles
//! turn clockwise, in degrees. The local origin is the segment's entry port,
//! and every transform rotates about it before translating and scaling:
//!
//! ```text
//! wx = (ox + lx * cos(θ) - ly * sin(θ)) * scale
//! wy = (oy + lx * sin(θ) + ly * cos(θ)) * scale
//! ```
//!
//! Rotating about any other point would move the entry port, and snapping
//! relies on the entry port staying at the placement origin.

use crate::config::PreviewBox;
use crate::error::TrackError;

use super::path::{Path, PathCommand};
use super::types::{normalize_degrees, Bounds, Point};

/// A rigid placement followed by a uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    /// Where the local origin lands, in local units
    pub origin: Point,
    /// Rotation about the local origin, degrees clockwise
    pub angle_degrees: f64,
    /// Uniform scale applied after rotation and translation
    pub scale: f64,
}

impl WorldTransform {
    /// Create a transform, rejecting non-positive or non-finite scales
    pub fn new(origin: Point, angle_degrees: f64, scale: f64) -> Result<Self, TrackError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(TrackError::InvalidScale { scale });
        }
        if !origin.is_finite() || !angle_degrees.is_finite() {
            return Err(TrackError::invalid_argument(
                "transform origin and angle must be finite",
            ));
        }
        Ok(Self {
            origin,
            angle_degrees,
            scale,
        })
    }

    /// Unscaled placement transform
    pub fn placement(origin: Point, angle_degrees: f64) -> Self {
        Self {
            origin,
            angle_degrees,
            scale: 1.0,
        }
    }

    /// Check if this is effectively a no-op
    pub fn is_identity(&self) -> bool {
        self.origin == Point::zero()
            && normalize_degrees(self.angle_degrees) == 0.0
            && self.scale == 1.0
    }

    /// Map a local point into the world
    pub fn transform_point(&self, point: Point) -> Point {
        (self.origin + point.rotated(self.angle_degrees)) * self.scale
    }

    /// Map a world point back into the local frame
    pub fn inverse_point(&self, point: Point) -> Point {
        (point * (1.0 / self.scale) - self.origin).rotated(-self.angle_degrees)
    }

    /// Rotate a direction (degrees) into the world frame, normalized to `[0, 360)`
    pub fn transform_direction(&self, degrees: f64) -> f64 {
        normalize_degrees(degrees + self.angle_degrees)
    }

    pub fn transform_command(&self, cmd: &PathCommand) -> PathCommand {
        cmd.map_points(self.scale, |p| self.transform_point(p))
    }

    pub fn transform_path(&self, path: &Path) -> Path {
        Path::new(
            path.commands
                .iter()
                .map(|c| self.transform_command(c))
                .collect(),
        )
    }
}

/// Map local commands into world coordinates.
///
/// Rotation and uniform positive scale preserve orientation, so arc sweep
/// and large-arc flags carry over unchanged while radii are scaled.
pub fn to_world(
    commands: &[PathCommand],
    origin_x: f64,
    origin_y: f64,
    angle_degrees: f64,
    scale: f64,
) -> Result<Vec<PathCommand>, TrackError> {
    let t = WorldTransform::new(Point::new(origin_x, origin_y), angle_degrees, scale)?;
    Ok(commands.iter().map(|c| t.transform_command(c)).collect())
}

/// Offset and scale that fit a shape into a fixed-size preview box.
///
/// No rotation is involved: the glyph keeps its local orientation, is
/// scaled uniformly so that it fits within the padded box, and is centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewFit {
    pub scale: f64,
    pub offset: Point,
}

impl PreviewFit {
    /// Compute the fit for shapes with the given local bounds.
    ///
    /// Ranges narrower than one unit count as one unit so that a straight
    /// piece (zero height) does not blow up the vertical scale.
    pub fn for_bounds(bounds: &Bounds, preview: &PreviewBox) -> Result<Self, TrackError> {
        let inner_w = preview.width - 2.0 * preview.padding;
        let inner_h = preview.height - 2.0 * preview.padding;
        if !(inner_w > 0.0 && inner_h > 0.0) {
            return Err(TrackError::invalid_argument(format!(
                "preview box {}x{} leaves no room inside padding {}",
                preview.width, preview.height, preview.padding
            )));
        }

        let range_x = bounds.width().max(1.0);
        let range_y = bounds.height().max(1.0);
        let scale = (inner_w / range_x).min(inner_h / range_y);
        let center = bounds.center();
        let offset = Point::new(
            preview.width / 2.0 - center.x * scale,
            preview.height / 2.0 - center.y * scale,
        );

        Ok(Self { scale, offset })
    }

    pub fn apply_point(&self, point: Point) -> Point {
        point * self.scale + self.offset
    }

    pub fn apply_path(&self, path: &Path) -> Path {
        Path::new(
            path.commands
                .iter()
                .map(|c| c.map_points(self.scale, |p| self.apply_point(p)))
                .collect(),
        )
    }
}
