//! Circular arc resolution.
//!
//! An `ArcTo` command only stores its end point, radius and two flags. To
//! compute tight bounds, sample points or hit test against an arc we need
//! its center and angular sweep, which this module derives using the same
//! center selection rule as SVG's elliptical arc implementation notes.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::types::{Bounds, Point};

/// Chords shorter than this are treated as zero-length arcs
pub const DEGENERATE_CHORD: f64 = 1e-9;

/// A fully resolved circular arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub start: Point,
    pub end: Point,
    pub center: Point,
    pub radius: f64,
    /// Angle of `start` as seen from `center`, in radians
    pub start_angle: f64,
    /// Signed sweep in radians, positive for clockwise (y-down) travel
    pub sweep: f64,
}

impl ArcGeometry {
    /// Resolve an arc from its endpoints and flags.
    ///
    /// Returns `None` when the arc cannot be drawn as an arc: the endpoints
    /// coincide, or the radius is not a positive finite number. A radius
    /// shorter than half the chord is clamped so that the arc becomes a
    /// half circle.
    pub fn resolve(
        start: Point,
        end: Point,
        radius: f64,
        clockwise: bool,
        large_arc: bool,
    ) -> Option<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return None;
        }
        let chord = end - start;
        let chord_len = chord.length();
        if chord_len < DEGENERATE_CHORD {
            return None;
        }

        let half = chord_len / 2.0;
        let radius = radius.max(half);
        let h = (radius * radius - half * half).max(0.0).sqrt();

        let unit = chord * (1.0 / chord_len);
        let normal = Point::new(-unit.y, unit.x);
        let side = if clockwise != large_arc { 1.0 } else { -1.0 };
        let mid = Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
        let center = mid + normal * (h * side);

        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let end_angle = (end.y - center.y).atan2(end.x - center.x);
        let sweep = if clockwise {
            (end_angle - start_angle).rem_euclid(TAU)
        } else {
            -(start_angle - end_angle).rem_euclid(TAU)
        };

        Some(Self {
            start,
            end,
            center,
            radius,
            start_angle,
            sweep,
        })
    }

    /// Point at parameter `t` in `[0, 1]` along the arc
    pub fn point_at(&self, t: f64) -> Point {
        if t <= 0.0 {
            return self.start;
        }
        if t >= 1.0 {
            return self.end;
        }
        let a = self.start_angle + self.sweep * t;
        Point::new(
            self.center.x + self.radius * a.cos(),
            self.center.y + self.radius * a.sin(),
        )
    }

    /// Arc length
    pub fn length(&self) -> f64 {
        self.radius * self.sweep.abs()
    }

    /// Swept angle in degrees (always positive)
    pub fn sweep_degrees(&self) -> f64 {
        self.sweep.abs().to_degrees()
    }

    /// Points where the arc touches its axis-aligned extremes (0°, 90°,
    /// 180°, 270° around the center) and which lie inside the swept range.
    pub fn extrema(&self) -> Vec<Point> {
        const CARDINALS: [(f64, f64, f64); 4] = [
            (0.0, 1.0, 0.0),
            (FRAC_PI_2, 0.0, 1.0),
            (PI, -1.0, 0.0),
            (PI + FRAC_PI_2, 0.0, -1.0),
        ];

        let span = self.sweep.abs();
        CARDINALS
            .iter()
            .filter(|(angle, _, _)| {
                let offset = if self.sweep >= 0.0 {
                    (angle - self.start_angle).rem_euclid(TAU)
                } else {
                    (self.start_angle - angle).rem_euclid(TAU)
                };
                offset <= span + 1e-12
            })
            .map(|(_, cos, sin)| {
                Point::new(
                    self.center.x + self.radius * cos,
                    self.center.y + self.radius * sin,
                )
            })
            .collect()
    }

    /// Tight axis-aligned bounds: endpoints plus any extrema on the sweep
    pub fn bounds(&self) -> Bounds {
        self.extrema()
            .into_iter()
            .fold(Bounds::from_point(self.start), |b, p| b.expand_to_include(p))
            .expand_to_include(self.end)
    }

    /// Sample `segments + 1` evenly spaced points, endpoints exact
    pub fn sample(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }

    /// Number of chord segments needed to stay within `tolerance` of the arc
    pub fn segments_for_tolerance(&self, tolerance: f64) -> usize {
        let tolerance = tolerance.max(1e-6).min(self.radius);
        // chord sagitta: r * (1 - cos(step / 2)) <= tolerance
        let step = 2.0 * (1.0 - tolerance / self.radius).acos();
        if step <= 0.0 || !step.is_finite() {
            return 64;
        }
        ((self.sweep.abs() / step).ceil() as usize).clamp(1, 512)
    }
}
