//! Integration tests for connectivity and snapping.
//!
//! These tests verify that:
//! - A dragged piece locks exactly onto a nearby open port
//! - Port matching is symmetric
//! - Snapping an already joined piece leaves it where it is
//! - Turnout branches join their own neighbors
//! - Routes are found through the connection graph

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;

use track_geometry::geometry::angular_difference;
use track_geometry::layout::{
    all_groups, apply_snap, connections, open_ports, ports_connect, shortest_path, world_ports,
};
use track_geometry::{
    build_chain, connected_group, try_find_snap_target, Catalog, ErrorKind, Point, PortId,
    SegmentId, ShapeLibrary, SnapConfig, TrackPlan,
};

const EPSILON: f64 = 1e-9;

/// Library with a single 100 mm straight
fn straight_library() -> ShapeLibrary {
    let catalog = Catalog::from_str(
        r#"
[metadata]
name = "Test straights"

[[segment]]
code = "S100"
name = "Straight 100 mm"
kind = "straight"
length = 100.0
"#,
    )
    .unwrap();
    ShapeLibrary::new(catalog)
}

fn place(
    plan: &mut TrackPlan,
    library: &mut ShapeLibrary,
    code: &str,
    origin: Point,
    rotation: f64,
) -> SegmentId {
    plan.place(library.default_shape(code).unwrap(), origin, rotation)
        .unwrap()
}

fn single(id: SegmentId) -> BTreeSet<SegmentId> {
    BTreeSet::from([id])
}

#[test]
fn test_head_to_head_snap() {
    let mut library = straight_library();
    let mut plan = TrackPlan::new();
    let snap = SnapConfig::default();

    let a = place(&mut plan, &mut library, "S100", Point::zero(), 0.0);
    let b = place(&mut plan, &mut library, "S100", Point::new(200.0, 0.5), 180.0);

    let target = try_find_snap_target(&plan, &single(b), &snap)
        .unwrap()
        .expect("B should find A");
    assert_eq!(target.target_segment, a);
    assert_eq!(target.target_port, PortId::B);
    assert_eq!(target.dragged_segment, b);
    assert_eq!(target.dragged_port, PortId::B);
    assert!((target.distance - 0.5).abs() < EPSILON);

    apply_snap(&mut plan, &single(b), &target).unwrap();
    let placed = plan.get(b).unwrap();
    assert!(placed.origin().approx_eq(Point::new(200.0, 0.0), EPSILON));
    assert_eq!(placed.rotation(), 180.0);

    // now joined without tolerance to spare
    assert_eq!(connections(&plan, &snap).len(), 1);
    assert_eq!(
        connected_group(&plan, a, &snap).unwrap(),
        BTreeSet::from([a, b])
    );
}

#[test]
fn test_out_of_tolerance_does_not_snap() {
    let mut library = straight_library();
    let mut plan = TrackPlan::new();

    place(&mut plan, &mut library, "S100", Point::zero(), 0.0);
    let far = place(&mut plan, &mut library, "S100", Point::new(103.0, 0.0), 0.0);
    let skewed = place(&mut plan, &mut library, "S100", Point::new(0.0, 0.0), 190.0);

    let snap = SnapConfig::default();
    assert!(try_find_snap_target(&plan, &single(far), &snap)
        .unwrap()
        .is_none());
    // meets port A of the first piece, but 10 degrees off
    assert!(try_find_snap_target(&plan, &single(skewed), &snap)
        .unwrap()
        .is_none());

    // a wider tolerance picks the far piece up
    let loose = SnapConfig::default().with_distance(5.0);
    assert!(try_find_snap_target(&plan, &single(far), &loose)
        .unwrap()
        .is_some());
}

#[test]
fn test_port_matching_is_symmetric() {
    let mut library = ShapeLibrary::default();
    let mut plan = TrackPlan::new();
    place(&mut plan, &mut library, "G231", Point::zero(), 0.0);
    place(&mut plan, &mut library, "R1", Point::new(231.5, 0.4), 2.0);
    place(&mut plan, &mut library, "WL", Point::new(-1.0, 1.0), 183.0);
    place(&mut plan, &mut library, "G62", Point::new(500.0, 500.0), 45.0);

    let snap = SnapConfig::default();
    let ports = world_ports(&plan);
    for a in &ports {
        for b in &ports {
            assert_eq!(
                ports_connect(a, b, &snap),
                ports_connect(b, a, &snap),
                "{}:{} vs {}:{}",
                a.segment,
                a.port,
                b.segment,
                b.port
            );
        }
    }
}

#[test]
fn test_closed_circle() {
    let mut library = ShapeLibrary::default();
    let snap = SnapConfig::default();
    let plan = build_chain(&mut library, &["R1"; 12], &snap).unwrap();

    assert_eq!(connections(&plan, &snap).len(), 12);
    assert!(open_ports(&plan, &snap).is_empty());
    assert_eq!(all_groups(&plan, &snap).unwrap().len(), 1);

    let everything: BTreeSet<SegmentId> = plan.ids().collect();
    assert!(try_find_snap_target(&plan, &everything, &snap)
        .unwrap()
        .is_none());
}

#[test]
fn test_snapping_joined_piece_is_idempotent() {
    let mut library = ShapeLibrary::default();
    let snap = SnapConfig::default();
    let mut plan = build_chain(&mut library, &["R1"; 12], &snap).unwrap();

    let piece = plan.ids().nth(4).unwrap();
    let before = plan.get(piece).unwrap().clone();

    let target = try_find_snap_target(&plan, &single(piece), &snap)
        .unwrap()
        .expect("neighbors are in reach");
    assert!(target.distance < 1e-6);
    apply_snap(&mut plan, &single(piece), &target).unwrap();

    let after = plan.get(piece).unwrap();
    assert!(after.origin().approx_eq(before.origin(), 1e-6));
    assert!(angular_difference(after.rotation(), before.rotation()) < 1e-6);
    assert_eq!(connections(&plan, &snap).len(), 12);
}

#[test]
fn test_group_moves_rigidly() {
    let mut library = straight_library();
    let mut plan = TrackPlan::new();
    let snap = SnapConfig::default();

    let fixed = place(&mut plan, &mut library, "S100", Point::zero(), 0.0);
    let first = place(&mut plan, &mut library, "S100", Point::new(101.0, 1.0), 2.0);
    let second = plan
        .attach(library.default_shape("S100").unwrap(), first, PortId::B)
        .unwrap();
    // within tolerance already, so the group has to be given explicitly
    let group = BTreeSet::from([first, second]);

    let target = try_find_snap_target(&plan, &group, &snap).unwrap().unwrap();
    assert_eq!(target.target_segment, fixed);
    apply_snap(&mut plan, &group, &target).unwrap();

    assert!(plan
        .get(first)
        .unwrap()
        .origin()
        .approx_eq(Point::new(100.0, 0.0), EPSILON));
    assert!(plan
        .get(second)
        .unwrap()
        .origin()
        .approx_eq(Point::new(200.0, 0.0), 1e-6));
    assert_eq!(
        connected_group(&plan, fixed, &snap).unwrap(),
        BTreeSet::from([fixed, first, second])
    );
}

#[test]
fn test_turnout_branches() {
    let mut library = ShapeLibrary::default();
    let mut plan = TrackPlan::new();
    let snap = SnapConfig::default();

    let turnout = place(&mut plan, &mut library, "WR", Point::zero(), 0.0);
    let straight = plan
        .attach(library.default_shape("G239").unwrap(), turnout, PortId::B)
        .unwrap();
    let branch = plan
        .attach(library.default_shape("R9").unwrap(), turnout, PortId::C)
        .unwrap();

    assert_eq!(connections(&plan, &snap).len(), 2);
    assert_eq!(
        connected_group(&plan, straight, &snap).unwrap(),
        BTreeSet::from([turnout, straight, branch])
    );

    let open: Vec<(SegmentId, PortId)> = open_ports(&plan, &snap)
        .iter()
        .map(|p| (p.segment, p.port))
        .collect();
    assert_eq!(
        open,
        vec![(turnout, PortId::A), (straight, PortId::B), (branch, PortId::B)]
    );

    // the branch leaves at 30 degrees: 15 from the turnout plus 15 from R9
    let exit = plan.get(branch).unwrap().world_port(PortId::B).unwrap();
    assert!((exit.direction - 30.0).abs() < 1e-6);
}

#[test]
fn test_shortest_path_through_turnout() {
    let mut library = ShapeLibrary::default();
    let mut plan = TrackPlan::new();
    let snap = SnapConfig::default();

    let turnout = place(&mut plan, &mut library, "WL", Point::zero(), 0.0);
    let lead = plan
        .attach(library.default_shape("G231").unwrap(), turnout, PortId::A)
        .unwrap();
    let through = plan
        .attach(library.default_shape("G239").unwrap(), turnout, PortId::B)
        .unwrap();
    let beyond = plan
        .attach(library.default_shape("G62").unwrap(), through, PortId::B)
        .unwrap();
    let island = place(&mut plan, &mut library, "G62", Point::new(0.0, 900.0), 0.0);

    assert_eq!(
        shortest_path(&plan, lead, beyond, &snap).unwrap(),
        Some(vec![lead, turnout, through, beyond])
    );
    assert_eq!(shortest_path(&plan, lead, island, &snap).unwrap(), None);
    assert_eq!(
        shortest_path(&plan, lead, lead, &snap).unwrap(),
        Some(vec![lead])
    );

    let err = shortest_path(&plan, lead, SegmentId::from_raw(999), &snap).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_unknown_article_suggests_codes() {
    let mut library = straight_library();
    let err = library.default_shape("S10").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.suggestions(), Some(&["S100".to_string()][..]));
}
