//! Integration tests for shape generation and the coordinate transform pipeline.
//!
//! These tests run over the whole built-in catalog and verify that:
//! - Generation is deterministic and always finite
//! - Analytic bounds are tight around the sampled geometry
//! - Every port lies on the generated path
//! - World transforms round-trip and compose
//! - Preview glyphs stay inside the padded preview box

use track_geometry::catalog::get_bounds;
use track_geometry::{
    to_world, Bounds, Catalog, Path, PathCommand, Point, PreviewBox, PreviewFit, ShapeLibrary,
    WorldTransform,
};

const EPSILON: f64 = 1e-6;

/// Sampling tolerance for flattened arcs, in mm
const FLATTEN: f64 = 0.01;

/// Every (article, entry port) pair of the default catalog
fn all_shapes() -> Vec<(String, track_geometry::PortId)> {
    let catalog = Catalog::default();
    catalog
        .iter()
        .flat_map(|spec| {
            spec.family
                .port_ids()
                .iter()
                .map(move |port| (spec.code.clone(), *port))
        })
        .collect()
}

fn sampled_bounds(path: &Path) -> Bounds {
    Bounds::from_points(path.flatten(FLATTEN).into_iter().flatten()).unwrap()
}

fn commands_match(a: &[PathCommand], b: &[PathCommand]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            let same_kind = match (x, y) {
                (PathCommand::MoveTo(_), PathCommand::MoveTo(_))
                | (PathCommand::LineTo(_), PathCommand::LineTo(_)) => true,
                (
                    PathCommand::ArcTo {
                        radius: r1,
                        clockwise: c1,
                        large_arc: l1,
                        ..
                    },
                    PathCommand::ArcTo {
                        radius: r2,
                        clockwise: c2,
                        large_arc: l2,
                        ..
                    },
                ) => (r1 - r2).abs() < EPSILON && c1 == c2 && l1 == l2,
                _ => false,
            };
            same_kind && x.end_point().approx_eq(y.end_point(), EPSILON)
        })
}

#[test]
fn test_generation_is_deterministic() {
    for (code, port) in all_shapes() {
        let first = ShapeLibrary::default().shape(&code, port).unwrap();
        let second = ShapeLibrary::default().shape(&code, port).unwrap();
        assert_eq!(first.path, second.path, "{} entered at {}", code, port);
        assert_eq!(first.ports, second.ports, "{} entered at {}", code, port);
    }
}

#[test]
fn test_geometry_is_finite() {
    let mut library = ShapeLibrary::default();
    for (code, port) in all_shapes() {
        let shape = library.shape(&code, port).unwrap();
        assert!(shape.commands().iter().all(|c| c.end_point().is_finite()));
        assert!(shape.ports.iter().all(|p| p.position.is_finite()));
    }
}

#[test]
fn test_bounds_are_tight() {
    let mut library = ShapeLibrary::default();
    for (code, port) in all_shapes() {
        let shape = library.shape(&code, port).unwrap();
        let analytic = get_bounds(shape.commands());
        let sampled = sampled_bounds(&shape.path);

        // every sample inside, and the analytic box no bigger than sampling error
        for p in shape.path.flatten(FLATTEN).into_iter().flatten() {
            assert!(analytic.contains_approx(p, EPSILON), "{} {}: {:?}", code, port, p);
        }
        assert!((analytic.min_x - sampled.min_x).abs() < FLATTEN + EPSILON, "{} {}", code, port);
        assert!((analytic.min_y - sampled.min_y).abs() < FLATTEN + EPSILON, "{} {}", code, port);
        assert!((analytic.max_x - sampled.max_x).abs() < FLATTEN + EPSILON, "{} {}", code, port);
        assert!((analytic.max_y - sampled.max_y).abs() < FLATTEN + EPSILON, "{} {}", code, port);
    }
}

#[test]
fn test_ports_lie_on_path() {
    let mut library = ShapeLibrary::default();
    for (code, port) in all_shapes() {
        let shape = library.shape(&code, port).unwrap();
        let lines = shape.path.flatten(FLATTEN);
        for p in &shape.ports {
            let on_path = lines
                .iter()
                .flatten()
                .any(|q| q.approx_eq(p.position, EPSILON));
            assert!(on_path, "{} entered at {}: port {} off path", code, port, p.id);
        }
    }
}

#[test]
fn test_transform_round_trip() {
    let t = WorldTransform::new(Point::new(120.5, -33.0), 37.5, 1.75).unwrap();
    for p in [
        Point::zero(),
        Point::new(230.93, 0.0),
        Point::new(-12.0, 907.97),
    ] {
        let back = t.inverse_point(t.transform_point(p));
        assert!(back.approx_eq(p, 1e-9), "{:?} -> {:?}", p, back);
    }
}

#[test]
fn test_transforms_compose() {
    let mut library = ShapeLibrary::default();
    let shape = library.default_shape("BWR").unwrap();
    let commands = shape.commands();

    let (o1, a1) = (Point::new(10.0, 20.0), 30.0);
    let (o2, a2) = (Point::new(-5.0, 7.0), 50.0);

    let first = to_world(commands, o1.x, o1.y, a1, 1.0).unwrap();
    let twice = to_world(&first, o2.x, o2.y, a2, 1.0).unwrap();
    let combined = o2 + o1.rotated(a2);
    let once = to_world(commands, combined.x, combined.y, a1 + a2, 1.0).unwrap();

    assert!(commands_match(&twice, &once));
}

#[test]
fn test_scale_is_uniform() {
    let mut library = ShapeLibrary::default();
    let shape = library.default_shape("R9").unwrap();
    let unit = Path::new(to_world(shape.commands(), 0.0, 0.0, 0.0, 1.0).unwrap()).bounds();
    let doubled = Path::new(to_world(shape.commands(), 0.0, 0.0, 0.0, 2.0).unwrap()).bounds();
    assert!((doubled.width() - 2.0 * unit.width()).abs() < EPSILON);
    assert!((doubled.height() - 2.0 * unit.height()).abs() < EPSILON);
}

#[test]
fn test_world_bounds_track_rotation() {
    let mut library = ShapeLibrary::default();
    let shape = library.default_shape("G231").unwrap();
    let rotated = Path::new(to_world(shape.commands(), 0.0, 0.0, 90.0, 1.0).unwrap());
    let bounds = rotated.bounds();
    assert!(bounds.width().abs() < EPSILON);
    assert!((bounds.height() - 230.93).abs() < EPSILON);
}

#[test]
fn test_previews_fit_the_box() {
    let mut library = ShapeLibrary::default();
    let preview = PreviewBox::default();
    for (code, port) in all_shapes() {
        let shape = library.shape(&code, port).unwrap();
        let fit = PreviewFit::for_bounds(&shape.bounds, &preview).unwrap();
        let glyph = sampled_bounds(&fit.apply_path(&shape.path));
        let slack = 0.5;
        assert!(glyph.min_x >= preview.padding - slack, "{} {}", code, port);
        assert!(glyph.min_y >= preview.padding - slack, "{} {}", code, port);
        assert!(glyph.max_x <= preview.width - preview.padding + slack, "{} {}", code, port);
        assert!(glyph.max_y <= preview.height - preview.padding + slack, "{} {}", code, port);
    }
}
