//! Snap resolution for a dragged group.
//!
//! On release every free port of the dragged group is tested against every
//! free port outside the group. The best pair decides one rigid correction
//! (rotation about the dragged port, then translation onto the target port)
//! that is applied to all group members alike.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::catalog::PortId;
use crate::config::SnapConfig;
use crate::error::TrackError;
use crate::geometry::{normalize_degrees, signed_degrees, Bounds, Point};

use super::connectivity::{ports_connect, WorldPort};
use super::plan::{SegmentId, TrackPlan};

/// Proposed correction that joins one dragged port to one target port
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    pub target_segment: SegmentId,
    pub target_port: PortId,
    pub dragged_segment: SegmentId,
    pub dragged_port: PortId,
    /// New origin for `dragged_segment`
    pub corrective_origin: Point,
    /// New rotation for `dragged_segment`, degrees in `[0, 360)`
    pub corrective_rotation: f64,
    /// Dragged port position before correction
    pub pivot: Point,
    /// Target port position; the pivot lands here
    pub anchor: Point,
    /// Rotation applied to the group about the pivot, in `(-180, 180]`
    pub delta_rotation: f64,
    pub distance: f64,
    pub angle_error: f64,
}

impl SnapTarget {
    /// Where a group member at `origin`/`rotation` ends up after the snap
    pub fn correct(&self, origin: Point, rotation: f64) -> (Point, f64) {
        let origin = self.anchor + (origin - self.pivot).rotated(self.delta_rotation);
        (origin, rotation + self.delta_rotation)
    }

    /// Combined error used as the secondary ranking key
    pub fn score(&self) -> f64 {
        self.distance + self.angle_error
    }

    fn rank(&self, other: &SnapTarget) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.score().total_cmp(&other.score()))
            .then(self.target_segment.cmp(&other.target_segment))
            .then(self.target_port.cmp(&other.target_port))
            .then(self.dragged_segment.cmp(&other.dragged_segment))
            .then(self.dragged_port.cmp(&other.dragged_port))
    }
}

/// Find the port pair the dragged `group` should lock onto.
///
/// Ports joined to another member of the group are ignored, as are target
/// ports that already have a partner. Ghost segments take no part, and only
/// segments whose bounds come near the group are examined. Ties are broken by distance, then by
/// distance plus angle error, then by segment identifier and port name so
/// the result does not depend on iteration order.
pub fn try_find_snap_target(
    plan: &TrackPlan,
    group: &BTreeSet<SegmentId>,
    snap: &SnapConfig,
) -> Result<Option<SnapTarget>, TrackError> {
    for id in group {
        plan.get(*id)?;
    }
    let mut inside = Vec::new();
    let mut reach: Option<Bounds> = None;
    for segment in plan.committed().filter(|s| group.contains(&s.id())) {
        inside.extend(segment.world_ports());
        let bounds = segment.world_bounds();
        reach = Some(reach.map_or(bounds, |r| r.union(&bounds)));
    }
    let Some(reach) = reach else {
        return Ok(None);
    };

    // a target port lies within one snap distance of the group, its partner within two
    let reach = reach.inflate(2.0 * snap.distance_mm);
    let outside: Vec<WorldPort> = plan
        .committed()
        .filter(|s| !group.contains(&s.id()))
        .filter(|s| s.world_bounds().intersects(&reach))
        .flat_map(|s| s.world_ports())
        .collect();

    let free_inside: Vec<&WorldPort> = inside
        .iter()
        .filter(|p| !inside.iter().any(|q| ports_connect(p, q, snap)))
        .collect();
    let free_outside: Vec<&WorldPort> = outside
        .iter()
        .filter(|p| !outside.iter().any(|q| ports_connect(p, q, snap)))
        .collect();

    let mut best: Option<SnapTarget> = None;
    for dragged in &free_inside {
        for target in &free_outside {
            if !ports_connect(dragged, target, snap) {
                continue;
            }
            let candidate = build_target(plan, dragged, target)?;
            tracing::trace!(
                dragged = %dragged.segment,
                dragged_port = %dragged.port,
                target = %target.segment,
                target_port = %target.port,
                distance = candidate.distance,
                angle_error = candidate.angle_error,
                "snap candidate"
            );
            best = match best {
                Some(current) if current.rank(&candidate) != Ordering::Greater => Some(current),
                _ => Some(candidate),
            };
        }
    }

    match &best {
        Some(t) => tracing::debug!(
            dragged = %t.dragged_segment,
            target = %t.target_segment,
            target_port = %t.target_port,
            distance = t.distance,
            "snap target found"
        ),
        None => tracing::debug!(size = group.len(), "no snap target"),
    }
    Ok(best)
}

fn build_target(
    plan: &TrackPlan,
    dragged: &WorldPort,
    target: &WorldPort,
) -> Result<SnapTarget, TrackError> {
    let delta_rotation = signed_degrees(target.direction + 180.0 - dragged.direction);
    let segment = plan.get(dragged.segment)?;
    let mut result = SnapTarget {
        target_segment: target.segment,
        target_port: target.port,
        dragged_segment: dragged.segment,
        dragged_port: dragged.port,
        corrective_origin: segment.origin(),
        corrective_rotation: segment.rotation(),
        pivot: dragged.position,
        anchor: target.position,
        delta_rotation,
        distance: dragged.distance(target),
        angle_error: dragged.angle_error(target),
    };
    let (origin, rotation) = result.correct(segment.origin(), segment.rotation());
    result.corrective_origin = origin;
    result.corrective_rotation = normalize_degrees(rotation);
    Ok(result)
}

/// Apply a snap correction rigidly to every member of `group`
pub fn apply_snap(
    plan: &mut TrackPlan,
    group: &BTreeSet<SegmentId>,
    target: &SnapTarget,
) -> Result<(), TrackError> {
    for id in group {
        let segment = plan.get(*id)?;
        let (origin, rotation) = target.correct(segment.origin(), segment.rotation());
        plan.set_pose(*id, origin, rotation)?;
    }
    Ok(())
}
