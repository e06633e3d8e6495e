//! Port connectivity, recomputed from current placements on every query.
//!
//! Two ports are joined when they lie within the snap distance of each other
//! and their outward tangents point in opposite directions (within the snap
//! angle). Nothing is cached, so the graph can never disagree with the plan.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::catalog::PortId;
use crate::config::SnapConfig;
use crate::error::TrackError;
use crate::geometry::{angular_difference, Point};

use super::plan::{SegmentId, TrackPlan};

/// A port of a placed segment, in world millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPort {
    pub segment: SegmentId,
    pub port: PortId,
    pub position: Point,
    /// Outward tangent, degrees in `[0, 360)`
    pub direction: f64,
}

impl WorldPort {
    /// Distance between the two port positions
    pub fn distance(&self, other: &WorldPort) -> f64 {
        self.position.distance(other.position)
    }

    /// How far the tangents are from being exactly opposite, in degrees
    pub fn angle_error(&self, other: &WorldPort) -> f64 {
        angular_difference(self.direction, other.direction + 180.0)
    }
}

/// Check whether two ports are joined under the given tolerances
pub fn ports_connect(a: &WorldPort, b: &WorldPort, snap: &SnapConfig) -> bool {
    a.segment != b.segment
        && a.distance(b) <= snap.distance_mm
        && a.angle_error(b) <= snap.angle_deg
}

/// A matched pair of ports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub a: WorldPort,
    pub b: WorldPort,
}

impl Connection {
    /// Check if this connection touches `segment`
    pub fn involves(&self, segment: SegmentId) -> bool {
        self.a.segment == segment || self.b.segment == segment
    }

    /// The segment on the other side, if `segment` is one end
    pub fn other(&self, segment: SegmentId) -> Option<SegmentId> {
        if self.a.segment == segment {
            Some(self.b.segment)
        } else if self.b.segment == segment {
            Some(self.a.segment)
        } else {
            None
        }
    }
}

/// Every port of every committed segment, in segment then port order
pub fn world_ports(plan: &TrackPlan) -> Vec<WorldPort> {
    plan.committed().flat_map(|s| s.world_ports()).collect()
}

/// Segments directly joined to `id` through at least one port pair.
///
/// Ghosts have no neighbors and are never anyone's neighbor.
pub fn neighbors(
    plan: &TrackPlan,
    id: SegmentId,
    snap: &SnapConfig,
) -> Result<BTreeSet<SegmentId>, TrackError> {
    let segment = plan.get(id)?;
    let mut result = BTreeSet::new();
    if segment.flags().ghost {
        return Ok(result);
    }
    let own = segment.world_ports();
    for other in plan.committed().filter(|s| s.id() != id) {
        let joined = other
            .world_ports()
            .iter()
            .any(|theirs| own.iter().any(|mine| ports_connect(mine, theirs, snap)));
        if joined {
            result.insert(other.id());
        }
    }
    Ok(result)
}

/// Breadth-first discovery of the maximal connected set containing `start`.
///
/// The result always contains `start` and is the same set whichever member
/// seeds the search.
pub fn connected_group(
    plan: &TrackPlan,
    start: SegmentId,
    snap: &SnapConfig,
) -> Result<BTreeSet<SegmentId>, TrackError> {
    plan.get(start)?;

    let mut group = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for next in neighbors(plan, current, snap)? {
            if group.insert(next) {
                queue.push_back(next);
            }
        }
    }

    tracing::debug!(start = %start, size = group.len(), "connected group");
    Ok(group)
}

/// Partition the committed segments into connected groups, ordered by smallest member
pub fn all_groups(
    plan: &TrackPlan,
    snap: &SnapConfig,
) -> Result<Vec<BTreeSet<SegmentId>>, TrackError> {
    let mut seen = BTreeSet::new();
    let mut groups = Vec::new();
    for id in plan.committed().map(|s| s.id()) {
        if seen.contains(&id) {
            continue;
        }
        let group = connected_group(plan, id, snap)?;
        seen.extend(group.iter().copied());
        groups.push(group);
    }
    Ok(groups)
}

/// Bulk port matching: every joined pair, each port used at most once.
///
/// Candidate pairs are taken closest first, so a port that is near two
/// others pairs with the nearer one.
pub fn connections(plan: &TrackPlan, snap: &SnapConfig) -> Vec<Connection> {
    let ports = world_ports(plan);

    let mut candidates = Vec::new();
    for (i, a) in ports.iter().enumerate() {
        for (j, b) in ports.iter().enumerate().skip(i + 1) {
            if ports_connect(a, b, snap) {
                candidates.push((a.distance(b) + a.angle_error(b), i, j));
            }
        }
    }
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

    let mut used = vec![false; ports.len()];
    let mut result = Vec::new();
    for (_, i, j) in candidates {
        if used[i] || used[j] {
            continue;
        }
        used[i] = true;
        used[j] = true;
        result.push(Connection {
            a: ports[i],
            b: ports[j],
        });
    }
    result
}

/// Ports that have no partner
pub fn open_ports(plan: &TrackPlan, snap: &SnapConfig) -> Vec<WorldPort> {
    let joined: BTreeSet<(SegmentId, PortId)> = connections(plan, snap)
        .iter()
        .flat_map(|c| [(c.a.segment, c.a.port), (c.b.segment, c.b.port)])
        .collect();
    world_ports(plan)
        .into_iter()
        .filter(|p| !joined.contains(&(p.segment, p.port)))
        .collect()
}

/// Fewest-segment route from `from` to `to`, both ends included.
///
/// Returns `None` when the two segments are not in the same group.
pub fn shortest_path(
    plan: &TrackPlan,
    from: SegmentId,
    to: SegmentId,
    snap: &SnapConfig,
) -> Result<Option<Vec<SegmentId>>, TrackError> {
    plan.get(from)?;
    plan.get(to)?;

    let mut parent: BTreeMap<SegmentId, SegmentId> = BTreeMap::new();
    let mut visited = BTreeSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        if current == to {
            let mut route = vec![to];
            let mut step = to;
            while let Some(&prev) = parent.get(&step) {
                route.push(prev);
                step = prev;
            }
            route.reverse();
            return Ok(Some(route));
        }
        for next in neighbors(plan, current, snap)? {
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    Ok(None)
}
