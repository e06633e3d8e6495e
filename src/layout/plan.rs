//! Placement model: the mutable set of segments on the canvas.
//!
//! The plan is an explicit owned store. Every mutation goes through it so
//! that identifiers stay unique and change notifications are never missed.
//! Connectivity is not stored here; it is recomputed from placements on
//! demand (see [`crate::layout::connectivity`]).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{PortId, SegmentShape};
use crate::error::TrackError;
use crate::geometry::{normalize_degrees, Bounds, Path, Point, WorldTransform};

use super::connectivity::WorldPort;

/// Chord tolerance used when flattening arcs for hit testing, in mm
const HIT_FLATTEN_TOLERANCE: f64 = 0.1;

/// Stable identifier of a placed segment; never reused within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u64);

impl SegmentId {
    /// Wrap a raw identifier, e.g. one read back from user input
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presentation state handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayFlags {
    pub selected: bool,
    /// Preview placement that is not part of the layout yet
    pub ghost: bool,
    pub hover: bool,
}

/// Transient drag bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragFlags {
    /// This segment is the one under the pointer
    pub dragging: bool,
    pub in_drag_group: bool,
    /// Pointer position minus segment origin, captured at drag start
    pub offset: Option<Point>,
}

/// One segment on the canvas
#[derive(Debug, Clone)]
pub struct PlacedSegment {
    id: SegmentId,
    shape: Arc<SegmentShape>,
    origin: Point,
    rotation: f64,
    flags: DisplayFlags,
    drag: DragFlags,
}

impl PlacedSegment {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn shape(&self) -> &Arc<SegmentShape> {
        &self.shape
    }

    pub fn article(&self) -> &str {
        &self.shape.article
    }

    pub fn entry_port(&self) -> PortId {
        self.shape.entry_port
    }

    /// World position of the entry port, in mm
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Rotation about the entry port, degrees in `[0, 360)`
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn flags(&self) -> DisplayFlags {
        self.flags
    }

    pub fn drag(&self) -> DragFlags {
        self.drag
    }

    /// Local to world (mm) transform
    pub fn transform(&self) -> WorldTransform {
        WorldTransform::placement(self.origin, self.rotation)
    }

    /// World-space path at the given pixel scale
    pub fn world_path(&self, scale: f64) -> Result<Path, TrackError> {
        let t = WorldTransform::new(self.origin, self.rotation, scale)?;
        Ok(t.transform_path(&self.shape.path))
    }

    /// World-space bounds in mm, arc extrema included
    pub fn world_bounds(&self) -> Bounds {
        self.transform().transform_path(&self.shape.path).bounds()
    }

    /// All ports of this segment in world coordinates (mm)
    pub fn world_ports(&self) -> Vec<WorldPort> {
        let t = self.transform();
        self.shape
            .ports
            .iter()
            .map(|p| WorldPort {
                segment: self.id,
                port: p.id,
                position: t.transform_point(p.position),
                direction: t.transform_direction(p.direction),
            })
            .collect()
    }

    pub fn world_port(&self, port: PortId) -> Option<WorldPort> {
        self.world_ports().into_iter().find(|p| p.port == port)
    }

    /// Distance from a world point (mm) to the track centerline
    pub fn distance_to(&self, point: Point) -> f64 {
        let local = self.transform().inverse_point(point);
        self.shape
            .path
            .flatten(HIT_FLATTEN_TOLERANCE)
            .iter()
            .flat_map(|line| line.windows(2))
            .map(|w| local.distance_to_segment(w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Change notification emitted by every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChange {
    Added(SegmentId),
    Moved(SegmentId),
    Rotated(SegmentId),
    Removed(SegmentId),
    FlagsChanged(SegmentId),
}

impl PlanChange {
    pub fn segment(&self) -> SegmentId {
        match *self {
            PlanChange::Added(id)
            | PlanChange::Moved(id)
            | PlanChange::Rotated(id)
            | PlanChange::Removed(id)
            | PlanChange::FlagsChanged(id) => id,
        }
    }
}

/// The set of placed segments
#[derive(Debug, Clone, Default)]
pub struct TrackPlan {
    segments: BTreeMap<SegmentId, PlacedSegment>,
    next_id: u64,
    changes: Vec<PlanChange>,
    revision: u64,
}

impl TrackPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a shape with its entry port at `origin`, rotated by `rotation` degrees
    pub fn place(
        &mut self,
        shape: Arc<SegmentShape>,
        origin: Point,
        rotation: f64,
    ) -> Result<SegmentId, TrackError> {
        check_pose(origin, rotation)?;
        self.next_id += 1;
        let id = SegmentId(self.next_id);
        self.segments.insert(
            id,
            PlacedSegment {
                id,
                shape,
                origin,
                rotation: normalize_degrees(rotation),
                flags: DisplayFlags::default(),
                drag: DragFlags::default(),
            },
        );
        self.notify(PlanChange::Added(id));
        tracing::trace!(segment = %id, x = origin.x, y = origin.y, rotation, "placed");
        Ok(id)
    }

    /// Place a shape so that its entry port joins `port` of `target`.
    ///
    /// The new piece's entry tangent (180° locally) must end up opposite the
    /// target port's outward tangent, so the rotation equals that tangent.
    pub fn attach(
        &mut self,
        shape: Arc<SegmentShape>,
        target: SegmentId,
        port: PortId,
    ) -> Result<SegmentId, TrackError> {
        let segment = self.get(target)?;
        let joint = segment.world_port(port).ok_or_else(|| {
            let valid: Vec<PortId> = segment.shape.ports.iter().map(|p| p.id).collect();
            TrackError::unknown_port(segment.article(), port.to_string(), &valid)
        })?;
        self.place(shape, joint.position, joint.direction)
    }

    pub fn get(&self, id: SegmentId) -> Result<&PlacedSegment, TrackError> {
        self.segments
            .get(&id)
            .ok_or(TrackError::unknown_segment(id.0))
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.contains_key(&id)
    }

    /// Move the entry port to `origin`
    pub fn move_to(&mut self, id: SegmentId, origin: Point) -> Result<(), TrackError> {
        let rotation = self.get(id)?.rotation;
        self.set_pose(id, origin, rotation)
    }

    pub fn translate(&mut self, id: SegmentId, delta: Point) -> Result<(), TrackError> {
        let origin = self.get(id)?.origin;
        self.move_to(id, origin + delta)
    }

    /// Set the absolute rotation about the entry port
    pub fn rotate(&mut self, id: SegmentId, rotation: f64) -> Result<(), TrackError> {
        let origin = self.get(id)?.origin;
        self.set_pose(id, origin, rotation)
    }

    /// Set origin and rotation together
    pub fn set_pose(
        &mut self,
        id: SegmentId,
        origin: Point,
        rotation: f64,
    ) -> Result<(), TrackError> {
        check_pose(origin, rotation)?;
        let segment = self
            .segments
            .get_mut(&id)
            .ok_or(TrackError::unknown_segment(id.0))?;
        let rotation = normalize_degrees(rotation);
        let moved = segment.origin != origin;
        let rotated = segment.rotation != rotation;
        segment.origin = origin;
        segment.rotation = rotation;
        if moved {
            self.notify(PlanChange::Moved(id));
        }
        if rotated {
            self.notify(PlanChange::Rotated(id));
        }
        Ok(())
    }

    /// Translate several segments by the same delta
    pub fn translate_group(
        &mut self,
        ids: impl IntoIterator<Item = SegmentId>,
        delta: Point,
    ) -> Result<(), TrackError> {
        for id in ids {
            self.translate(id, delta)?;
        }
        Ok(())
    }

    /// Rotate several segments rigidly by `delta` degrees about `pivot`
    pub fn rotate_group(
        &mut self,
        ids: impl IntoIterator<Item = SegmentId>,
        pivot: Point,
        delta: f64,
    ) -> Result<(), TrackError> {
        for id in ids {
            let segment = self.get(id)?;
            let origin = segment.origin.rotated_around(pivot, delta);
            let rotation = segment.rotation + delta;
            self.set_pose(id, origin, rotation)?;
        }
        Ok(())
    }

    /// Remove a segment; its identifier is never handed out again
    pub fn remove(&mut self, id: SegmentId) -> Result<PlacedSegment, TrackError> {
        let segment = self
            .segments
            .remove(&id)
            .ok_or(TrackError::unknown_segment(id.0))?;
        self.notify(PlanChange::Removed(id));
        tracing::trace!(segment = %id, "removed");
        Ok(segment)
    }

    /// Segments in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &PlacedSegment> {
        self.segments.values()
    }

    /// Segments that belong to the layout, ghosts left out
    pub fn committed(&self) -> impl Iterator<Item = &PlacedSegment> {
        self.segments.values().filter(|s| !s.flags.ghost)
    }

    pub fn ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn set_flags(&mut self, id: SegmentId, flags: DisplayFlags) -> Result<(), TrackError> {
        let segment = self
            .segments
            .get_mut(&id)
            .ok_or(TrackError::unknown_segment(id.0))?;
        if segment.flags != flags {
            segment.flags = flags;
            self.notify(PlanChange::FlagsChanged(id));
        }
        Ok(())
    }

    /// Make `id` the only selected segment, or clear the selection
    pub fn select(&mut self, id: Option<SegmentId>) -> Result<(), TrackError> {
        if let Some(id) = id {
            self.get(id)?;
        }
        self.update_flags(|segment| segment.flags.selected = Some(segment.id) == id);
        Ok(())
    }

    /// Make `id` the only hovered segment, or clear hover
    pub fn hover(&mut self, id: Option<SegmentId>) -> Result<(), TrackError> {
        if let Some(id) = id {
            self.get(id)?;
        }
        self.update_flags(|segment| segment.flags.hover = Some(segment.id) == id);
        Ok(())
    }

    pub fn selected(&self) -> Option<SegmentId> {
        self.iter().find(|s| s.flags.selected).map(|s| s.id)
    }

    pub(crate) fn set_drag(&mut self, id: SegmentId, drag: DragFlags) -> Result<(), TrackError> {
        let segment = self
            .segments
            .get_mut(&id)
            .ok_or(TrackError::unknown_segment(id.0))?;
        if segment.drag != drag {
            segment.drag = drag;
            self.notify(PlanChange::FlagsChanged(id));
        }
        Ok(())
    }

    /// Topmost non-ghost segment whose centerline passes within `tolerance` mm
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<SegmentId> {
        self.segments
            .values()
            .rev()
            .filter(|s| !s.flags.ghost)
            .filter(|s| s.world_bounds().inflate(tolerance).contains(point))
            .find(|s| s.distance_to(point) <= tolerance)
            .map(|s| s.id)
    }

    /// World bounds of all segments, in mm
    pub fn bounds(&self) -> Option<Bounds> {
        self.segments
            .values()
            .map(|s| s.world_bounds())
            .reduce(|a, b| a.union(&b))
    }

    /// Immutable copy of everything a renderer needs
    pub fn snapshot(&self, scale: f64) -> Result<PlanSnapshot, TrackError> {
        let segments = self
            .segments
            .values()
            .map(|s| {
                Ok(SegmentView {
                    id: s.id,
                    article: s.shape.article.clone(),
                    path: s.world_path(scale)?,
                    flags: s.flags,
                    dragging: s.drag.in_drag_group,
                })
            })
            .collect::<Result<Vec<_>, TrackError>>()?;
        Ok(PlanSnapshot {
            revision: self.revision,
            scale,
            segments,
        })
    }

    /// Drain pending change notifications in the order they happened
    pub fn take_changes(&mut self) -> Vec<PlanChange> {
        std::mem::take(&mut self.changes)
    }

    /// Number of changes ever made to this plan
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn notify(&mut self, change: PlanChange) {
        self.revision += 1;
        self.changes.push(change);
    }

    fn update_flags(&mut self, mut f: impl FnMut(&mut PlacedSegment)) {
        let mut changed = Vec::new();
        for segment in self.segments.values_mut() {
            let before = segment.flags;
            f(segment);
            if segment.flags != before {
                changed.push(segment.id);
            }
        }
        for id in changed {
            self.notify(PlanChange::FlagsChanged(id));
        }
    }
}

fn check_pose(origin: Point, rotation: f64) -> Result<(), TrackError> {
    if origin.is_finite() && rotation.is_finite() {
        Ok(())
    } else {
        Err(TrackError::invalid_argument(format!(
            "placement ({}, {}) rotated {} is not finite",
            origin.x, origin.y, rotation
        )))
    }
}

/// Rendering view of one segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentView {
    pub id: SegmentId,
    pub article: String,
    /// World path in pixels
    pub path: Path,
    pub flags: DisplayFlags,
    pub dragging: bool,
}

/// Immutable state of a plan at one revision
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSnapshot {
    pub revision: u64,
    pub scale: f64,
    pub segments: Vec<SegmentView>,
}

impl PlanSnapshot {
    /// Bounds of all segment paths, in pixels
    pub fn bounds(&self) -> Option<Bounds> {
        self.segments
            .iter()
            .map(|s| s.path.bounds())
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ShapeLibrary;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn straight(library: &mut ShapeLibrary) -> Arc<SegmentShape> {
        library.default_shape("G231").unwrap()
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        let b = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        plan.remove(b).unwrap();
        let c = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        assert!(a < b && b < c);
        assert!(!plan.contains(b));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_mutations_notify() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        plan.move_to(a, Point::new(10.0, 0.0)).unwrap();
        plan.rotate(a, 90.0).unwrap();
        plan.move_to(a, Point::new(10.0, 0.0)).unwrap(); // no-op
        plan.remove(a).unwrap();
        assert_eq!(
            plan.take_changes(),
            vec![
                PlanChange::Added(a),
                PlanChange::Moved(a),
                PlanChange::Rotated(a),
                PlanChange::Removed(a),
            ]
        );
        assert!(plan.take_changes().is_empty());
        assert_eq!(plan.revision(), 4);
    }

    #[test]
    fn test_unknown_segment() {
        let mut plan = TrackPlan::new();
        let err = plan.move_to(SegmentId(7), Point::zero()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(plan.remove(SegmentId(7)).is_err());
    }

    #[test]
    fn test_non_finite_pose_rejected() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let err = plan
            .place(straight(&mut library), Point::new(f64::NAN, 0.0), 0.0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_rotation_is_normalized() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan.place(straight(&mut library), Point::zero(), -90.0).unwrap();
        assert_eq!(plan.get(a).unwrap().rotation(), 270.0);
    }

    #[test]
    fn test_world_ports_follow_placement() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan
            .place(straight(&mut library), Point::new(10.0, 20.0), 90.0)
            .unwrap();
        let b = plan.get(a).unwrap().world_port(PortId::B).unwrap();
        assert!(b.position.approx_eq(Point::new(10.0, 250.93), 1e-9));
        assert_eq!(b.direction, 90.0);
    }

    #[test]
    fn test_attach_joins_ports() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan
            .place(library.default_shape("R1").unwrap(), Point::zero(), 0.0)
            .unwrap();
        let b = plan.attach(straight(&mut library), a, PortId::B).unwrap();
        let exit = plan.get(a).unwrap().world_port(PortId::B).unwrap();
        let entry = plan.get(b).unwrap().world_port(PortId::A).unwrap();
        assert!(exit.position.approx_eq(entry.position, 1e-9));
        assert!(
            (crate::geometry::angular_difference(exit.direction, entry.direction) - 180.0).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_attach_unknown_port() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        let err = plan.attach(straight(&mut library), a, PortId::D).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_rotate_group_is_rigid() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        let b = plan.attach(straight(&mut library), a, PortId::B).unwrap();
        plan.rotate_group([a, b], Point::zero(), 90.0).unwrap();
        let b_seg = plan.get(b).unwrap();
        assert!(b_seg.origin().approx_eq(Point::new(0.0, 230.93), 1e-9));
        assert_eq!(b_seg.rotation(), 90.0);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        let b = plan
            .place(straight(&mut library), Point::new(0.0, 100.0), 0.0)
            .unwrap();
        plan.select(Some(a)).unwrap();
        plan.select(Some(b)).unwrap();
        assert_eq!(plan.selected(), Some(b));
        assert!(!plan.get(a).unwrap().flags().selected);
        plan.select(None).unwrap();
        assert_eq!(plan.selected(), None);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        let b = plan.place(straight(&mut library), Point::zero(), 0.0).unwrap();
        assert_eq!(plan.hit_test(Point::new(50.0, 2.0), 3.0), Some(b));
        assert_eq!(plan.hit_test(Point::new(50.0, 5.0), 3.0), None);

        let mut flags = plan.get(b).unwrap().flags();
        flags.ghost = true;
        plan.set_flags(b, flags).unwrap();
        assert_eq!(plan.hit_test(Point::new(50.0, 2.0), 3.0), Some(a));
    }

    #[test]
    fn test_hit_test_on_curve() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan
            .place(library.default_shape("R1").unwrap(), Point::zero(), 0.0)
            .unwrap();
        // midpoint of the 30° arc around center (0, 360)
        let (sin, cos) = 15f64.to_radians().sin_cos();
        let mid = Point::new(360.0 * sin, 360.0 - 360.0 * cos);
        assert_eq!(plan.hit_test(mid, 0.5), Some(a));
        // the chord midpoint lies inside the curve, off the track
        assert_eq!(plan.hit_test(Point::new(90.0, 24.1), 0.5), None);
    }

    #[test]
    fn test_snapshot_scales_paths() {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        plan.place(straight(&mut library), Point::new(10.0, 0.0), 0.0)
            .unwrap();
        let snapshot = plan.snapshot(2.0).unwrap();
        assert_eq!(snapshot.segments.len(), 1);
        let bounds = snapshot.bounds().unwrap();
        assert_eq!(bounds.min_x, 20.0);
        assert!((bounds.max_x - 481.86).abs() < 1e-9);
        assert!(plan.snapshot(0.0).is_err());
    }
}
