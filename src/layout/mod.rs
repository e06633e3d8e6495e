//! Track plan layout: placed segments, their connectivity and snapping
//!
//! The plan owns every placement. Connectivity and snap targets are derived
//! from it on demand, so callers always see the current topology.

pub mod connectivity;
pub mod plan;
pub mod snap;

pub use connectivity::{
    all_groups, connected_group, connections, neighbors, open_ports, ports_connect,
    shortest_path, world_ports, Connection, WorldPort,
};
pub use plan::{
    DisplayFlags, DragFlags, PlacedSegment, PlanChange, PlanSnapshot, SegmentId, SegmentView,
    TrackPlan,
};
pub use snap::{apply_snap, try_find_snap_target, SnapTarget};
