//! Pointer-driven drag and snap of connected groups.
//!
//! `Idle -> PendingDrag -> Dragging -> Idle`. A press on a segment arms the
//! threshold helper; crossing it promotes the press into a drag of the whole
//! connected group; release asks the snap engine for a correction. Losing
//! capture, or a move that reports the button up, abandons the drag in
//! place without snapping.

use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::error::TrackError;
use crate::geometry::Point;
use crate::layout::{
    apply_snap, connected_group, try_find_snap_target, DragFlags, SegmentId, SnapTarget,
    TrackPlan,
};

use super::threshold::DragThreshold;
use super::viewport::Viewport;

/// Pointer input, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed {
        position: Point,
    },
    Moved {
        position: Point,
        /// Whether the drag button is still held
        primary_pressed: bool,
    },
    Released {
        position: Point,
    },
    CaptureLost,
}

/// Result of feeding one event to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Nothing happened
    Ignored,
    /// Click without drag; `None` when the canvas was clicked
    Selected(Option<SegmentId>),
    /// Press on a segment, waiting for the threshold
    Pending(SegmentId),
    DragStarted {
        segment: SegmentId,
        group: BTreeSet<SegmentId>,
    },
    Moved(SegmentId),
    Dropped {
        segment: SegmentId,
        snap: Option<SnapTarget>,
    },
    Cancelled(SegmentId),
}

/// Where the controller is in the press/drag/release cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    PendingDrag {
        segment: SegmentId,
        /// Press position in world millimetres
        press: Point,
    },
    Dragging {
        segment: SegmentId,
        members: Vec<GroupMemberOffset>,
    },
}

/// Offset of one dragged group member, captured at drag start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMemberOffset {
    pub segment: SegmentId,
    /// Pointer world position minus segment origin
    pub offset: Point,
}

/// Drives a [`TrackPlan`] from pointer events
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    threshold: DragThreshold,
    config: EngineConfig,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DragController {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: DragState::Idle,
            threshold: DragThreshold::new(config.interaction.drag_threshold_px),
            config,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// True while the controller owns the pointer
    pub fn has_capture(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Segments currently being dragged
    pub fn drag_group(&self) -> BTreeSet<SegmentId> {
        match &self.state {
            DragState::Dragging { members, .. } => members.iter().map(|m| m.segment).collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Feed one pointer event.
    ///
    /// On error the controller falls back to `Idle` so a stale segment
    /// id cannot wedge it. Surviving members of an interrupted drag get
    /// their drag flags cleared.
    pub fn handle(
        &mut self,
        plan: &mut TrackPlan,
        viewport: &Viewport,
        event: PointerEvent,
    ) -> Result<DragOutcome, TrackError> {
        let result = self.dispatch(plan, viewport, event);
        if let Err(err) = &result {
            self.threshold.reset();
            if let DragState::Dragging { members, .. } = std::mem::take(&mut self.state) {
                clear_drag_flags(plan, &members);
            }
            tracing::debug!(error = %err, "pointer event failed, back to idle");
        }
        result
    }

    fn dispatch(
        &mut self,
        plan: &mut TrackPlan,
        viewport: &Viewport,
        event: PointerEvent,
    ) -> Result<DragOutcome, TrackError> {
        match (self.state.clone(), event) {
            (DragState::Idle, PointerEvent::Pressed { position }) => {
                self.press(plan, viewport, position)
            }
            (DragState::Idle, PointerEvent::Moved { position, .. }) => {
                let hit = self.hit(plan, viewport, position);
                plan.hover(hit)?;
                Ok(DragOutcome::Ignored)
            }
            (DragState::Idle, _) => Ok(DragOutcome::Ignored),

            (
                DragState::PendingDrag { segment, press },
                PointerEvent::Moved {
                    position,
                    primary_pressed: true,
                },
            ) => {
                if !self.threshold.should_start_drag(position) {
                    return Ok(DragOutcome::Ignored);
                }
                self.threshold.reset();
                self.begin_drag(plan, segment, press, viewport.screen_to_world(position))
            }
            (DragState::PendingDrag { segment, .. }, PointerEvent::Released { .. }) => {
                self.threshold.reset();
                self.state = DragState::Idle;
                tracing::debug!(segment = %segment, "click");
                Ok(DragOutcome::Selected(Some(segment)))
            }
            (
                DragState::PendingDrag { segment, .. },
                PointerEvent::Moved {
                    primary_pressed: false,
                    ..
                }
                | PointerEvent::CaptureLost,
            ) => {
                self.threshold.reset();
                self.state = DragState::Idle;
                Ok(DragOutcome::Cancelled(segment))
            }

            (
                DragState::Dragging { segment, members },
                PointerEvent::Moved {
                    position,
                    primary_pressed: true,
                },
            ) => {
                move_members(plan, &members, viewport.screen_to_world(position))?;
                Ok(DragOutcome::Moved(segment))
            }
            (DragState::Dragging { segment, members }, PointerEvent::Released { position }) => {
                move_members(plan, &members, viewport.screen_to_world(position))?;
                let group: BTreeSet<SegmentId> = members.iter().map(|m| m.segment).collect();
                let snap = try_find_snap_target(plan, &group, &self.config.snap)?;
                if let Some(target) = &snap {
                    apply_snap(plan, &group, target)?;
                }
                self.end_drag(plan, &members);
                tracing::debug!(segment = %segment, snapped = snap.is_some(), "drag dropped");
                Ok(DragOutcome::Dropped { segment, snap })
            }
            (
                DragState::Dragging { segment, members },
                PointerEvent::Moved {
                    primary_pressed: false,
                    ..
                }
                | PointerEvent::CaptureLost,
            ) => {
                self.end_drag(plan, &members);
                tracing::debug!(segment = %segment, "drag cancelled");
                Ok(DragOutcome::Cancelled(segment))
            }

            (_, PointerEvent::Pressed { .. }) => Ok(DragOutcome::Ignored),
        }
    }

    fn hit(&self, plan: &TrackPlan, viewport: &Viewport, position: Point) -> Option<SegmentId> {
        let tolerance =
            viewport.screen_distance_to_world(self.config.interaction.hit_tolerance_px);
        plan.hit_test(viewport.screen_to_world(position), tolerance)
    }

    fn press(
        &mut self,
        plan: &mut TrackPlan,
        viewport: &Viewport,
        position: Point,
    ) -> Result<DragOutcome, TrackError> {
        let Some(segment) = self.hit(plan, viewport, position) else {
            plan.select(None)?;
            return Ok(DragOutcome::Selected(None));
        };
        plan.select(Some(segment))?;
        self.threshold.begin_tracking(position);
        self.state = DragState::PendingDrag {
            segment,
            press: viewport.screen_to_world(position),
        };
        tracing::debug!(segment = %segment, "pending drag");
        Ok(DragOutcome::Pending(segment))
    }

    fn begin_drag(
        &mut self,
        plan: &mut TrackPlan,
        segment: SegmentId,
        press: Point,
        current: Point,
    ) -> Result<DragOutcome, TrackError> {
        let group = connected_group(plan, segment, &self.config.snap)?;
        let mut members = Vec::with_capacity(group.len());
        for id in &group {
            let offset = press - plan.get(*id)?.origin();
            plan.set_drag(
                *id,
                DragFlags {
                    dragging: *id == segment,
                    in_drag_group: true,
                    offset: Some(offset),
                },
            )?;
            members.push(GroupMemberOffset {
                segment: *id,
                offset,
            });
        }
        move_members(plan, &members, current)?;

        tracing::debug!(segment = %segment, size = group.len(), "drag started");
        self.state = DragState::Dragging { segment, members };
        Ok(DragOutcome::DragStarted { segment, group })
    }

    fn end_drag(&mut self, plan: &mut TrackPlan, members: &[GroupMemberOffset]) {
        self.state = DragState::Idle;
        clear_drag_flags(plan, members);
    }
}

/// Reset drag flags of every member still in the plan
fn clear_drag_flags(plan: &mut TrackPlan, members: &[GroupMemberOffset]) {
    for member in members {
        if plan.contains(member.segment) {
            // cannot fail, the segment exists
            let _ = plan.set_drag(member.segment, DragFlags::default());
        }
    }
}

/// Every member follows the pointer rigidly: `origin = pointer - offset`.
///
/// All members are checked first, so a missing one leaves the group untouched.
fn move_members(
    plan: &mut TrackPlan,
    members: &[GroupMemberOffset],
    pointer: Point,
) -> Result<(), TrackError> {
    for member in members {
        plan.get(member.segment)?;
    }
    for member in members {
        plan.move_to(member.segment, pointer - member.offset)?;
    }
    Ok(())
}
