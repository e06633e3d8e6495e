//! Segment shape generation.
//!
//! Every family is first built in its canonical frame: port A at the origin
//! with its outward tangent pointing along -x (180°), the piece extending
//! towards +x. Entering through another port re-anchors that canonical shape
//! rigidly so the chosen port lands on the origin facing 180°.
//!
//! Port tangents always point *out* of the piece. Two ports that join
//! therefore have opposite tangents.

use std::fmt;
use std::str::FromStr;

use crate::error::TrackError;
use crate::geometry::types::sin_cos_degrees;
use crate::geometry::{normalize_degrees, Bounds, Path, PathCommand, Point};

use super::{SegmentFamily, SegmentSpec};

/// Outward tangent of the entry port in the local frame
pub const ENTRY_DIRECTION: f64 = 180.0;

/// A port name, one of `A` to `D`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(char);

impl PortId {
    pub const A: PortId = PortId('A');
    pub const B: PortId = PortId('B');
    pub const C: PortId = PortId('C');
    pub const D: PortId = PortId('D');

    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortId {
    type Err = TrackError;

    /// Accepts `A`..`D` in either case, optionally prefixed with `Port`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed
            .strip_prefix("Port")
            .or_else(|| trimmed.strip_prefix("port"))
            .unwrap_or(trimmed);
        let mut chars = name.chars();
        match (chars.next().map(|c| c.to_ascii_uppercase()), chars.next()) {
            (Some(c @ 'A'..='D'), None) => Ok(PortId(c)),
            _ => Err(TrackError::invalid_argument(format!(
                "'{}' is not a port name (expected A, B, C or D)",
                s
            ))),
        }
    }
}

/// A connection point in a shape's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    pub id: PortId,
    pub position: Point,
    /// Outward tangent in degrees, normalized to `[0, 360)`
    pub direction: f64,
}

impl Port {
    fn new(id: PortId, position: Point, direction: f64) -> Self {
        Self {
            id,
            position,
            direction: normalize_degrees(direction),
        }
    }
}

/// Immutable geometry for one (article, entry port) pair
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentShape {
    pub article: String,
    pub entry_port: PortId,
    pub path: Path,
    pub bounds: Bounds,
    /// Every port of the piece in name order, the entry port included
    pub ports: Vec<Port>,
}

impl SegmentShape {
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }

    /// Ports other than the entry port
    pub fn exit_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(move |p| p.id != self.entry_port)
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.path.commands
    }
}

/// Path commands for an article entered through `entry`
pub fn get_path(spec: &SegmentSpec, entry: PortId) -> Result<Path, TrackError> {
    Ok(generate_shape(spec, entry)?.path)
}

/// Bounds of a command sequence, arc extrema included
pub fn get_bounds(commands: &[PathCommand]) -> Bounds {
    Path::new(commands.to_vec()).bounds()
}

/// Build the complete shape for an article entered through `entry`
pub fn generate_shape(spec: &SegmentSpec, entry: PortId) -> Result<SegmentShape, TrackError> {
    spec.family
        .validate()
        .map_err(|reason| TrackError::degenerate(&spec.code, reason))?;

    let valid = spec.family.port_ids();
    if !valid.contains(&entry) {
        return Err(TrackError::unknown_port(&spec.code, entry.to_string(), valid));
    }

    let (commands, ports) = canonical(&spec.family);
    let (commands, ports) = reanchor(commands, ports, entry);

    let path = Path::new(commands);
    let degenerate = path.commands.iter().any(|c| !c.end_point().is_finite());
    if degenerate || path.figures().is_empty() {
        return Err(TrackError::degenerate(
            &spec.code,
            "generated path has no drawable extent",
        ));
    }

    let bounds = path.bounds();
    Ok(SegmentShape {
        article: spec.code.clone(),
        entry_port: entry,
        path,
        bounds,
        ports,
    })
}

/// End point of an arc leaving the origin along +x
fn arc_end(radius: f64, angle: f64, sign: f64) -> Point {
    let (sin, cos) = sin_cos_degrees(angle);
    Point::new(radius * sin, sign * radius * (1.0 - cos))
}

fn arc_to(end: Point, radius: f64, sign: f64) -> PathCommand {
    PathCommand::ArcTo {
        end,
        radius,
        clockwise: sign > 0.0,
        large_arc: false,
    }
}

/// Shape commands and ports with port A at the origin
fn canonical(family: &SegmentFamily) -> (Vec<PathCommand>, Vec<Port>) {
    use PathCommand::{LineTo, MoveTo};

    let origin = Point::zero();
    let entry = Port::new(PortId::A, origin, ENTRY_DIRECTION);

    match *family {
        SegmentFamily::Straight { length } => {
            let end = Point::new(length, 0.0);
            (
                vec![MoveTo(origin), LineTo(end)],
                vec![entry, Port::new(PortId::B, end, 0.0)],
            )
        }
        SegmentFamily::Curve {
            radius,
            angle,
            hand,
        } => {
            let s = hand.sign();
            let end = arc_end(radius, angle, s);
            (
                vec![MoveTo(origin), arc_to(end, radius, s)],
                vec![entry, Port::new(PortId::B, end, s * angle)],
            )
        }
        SegmentFamily::Turnout {
            length,
            radius,
            angle,
            hand,
        } => {
            let s = hand.sign();
            let straight = Point::new(length, 0.0);
            let diverging = arc_end(radius, angle, s);
            (
                vec![
                    MoveTo(origin),
                    LineTo(straight),
                    MoveTo(origin),
                    arc_to(diverging, radius, s),
                ],
                vec![
                    entry,
                    Port::new(PortId::B, straight, 0.0),
                    Port::new(PortId::C, diverging, s * angle),
                ],
            )
        }
        SegmentFamily::ThreeWay {
            length,
            radius,
            angle,
        } => {
            let straight = Point::new(length, 0.0);
            let left = arc_end(radius, angle, -1.0);
            let right = arc_end(radius, angle, 1.0);
            (
                vec![
                    MoveTo(origin),
                    LineTo(straight),
                    MoveTo(origin),
                    arc_to(left, radius, -1.0),
                    MoveTo(origin),
                    arc_to(right, radius, 1.0),
                ],
                vec![
                    entry,
                    Port::new(PortId::B, straight, 0.0),
                    Port::new(PortId::C, left, -angle),
                    Port::new(PortId::D, right, angle),
                ],
            )
        }
        SegmentFamily::YSwitch { radius, angle } => {
            let left = arc_end(radius, angle, -1.0);
            let right = arc_end(radius, angle, 1.0);
            (
                vec![
                    MoveTo(origin),
                    arc_to(left, radius, -1.0),
                    MoveTo(origin),
                    arc_to(right, radius, 1.0),
                ],
                vec![
                    entry,
                    Port::new(PortId::B, left, -angle),
                    Port::new(PortId::C, right, angle),
                ],
            )
        }
        SegmentFamily::CurvedTurnout {
            inner_radius,
            outer_radius,
            angle,
            hand,
        } => {
            let s = hand.sign();
            let inner = arc_end(inner_radius, angle, s);
            let outer = arc_end(outer_radius, angle, s);
            (
                vec![
                    MoveTo(origin),
                    arc_to(inner, inner_radius, s),
                    MoveTo(origin),
                    arc_to(outer, outer_radius, s),
                ],
                vec![
                    entry,
                    Port::new(PortId::B, inner, s * angle),
                    Port::new(PortId::C, outer, s * angle),
                ],
            )
        }
        SegmentFamily::Crossing { length, angle } => crossing(length, angle),
        SegmentFamily::DoubleSlip { length, angle } => {
            let (mut commands, ports) = crossing(length, angle);
            // Slip arcs are tangent to both straights: r = (L/2) / tan(a/2)
            let slip_radius = (length / 2.0) / (angle / 2.0).to_radians().tan();
            let c = ports[2].position;
            let d = ports[3].position;
            commands.extend([
                MoveTo(origin),
                arc_to(d, slip_radius, 1.0),
                MoveTo(c),
                arc_to(Point::new(length, 0.0), slip_radius, -1.0),
            ]);
            (commands, ports)
        }
    }
}

/// Two straights of `length` crossing at their midpoints
fn crossing(length: f64, angle: f64) -> (Vec<PathCommand>, Vec<Port>) {
    let half = length / 2.0;
    let center = Point::new(half, 0.0);
    let axis = Point::from_angle(angle) * half;
    let c = center - axis;
    let d = center + axis;
    (
        vec![
            PathCommand::MoveTo(Point::zero()),
            PathCommand::LineTo(Point::new(length, 0.0)),
            PathCommand::MoveTo(c),
            PathCommand::LineTo(d),
        ],
        vec![
            Port::new(PortId::A, Point::zero(), ENTRY_DIRECTION),
            Port::new(PortId::B, Point::new(length, 0.0), 0.0),
            Port::new(PortId::C, c, 180.0 + angle),
            Port::new(PortId::D, d, angle),
        ],
    )
}

/// Move `entry` to the origin with its tangent facing 180°
fn reanchor(
    commands: Vec<PathCommand>,
    ports: Vec<Port>,
    entry: PortId,
) -> (Vec<PathCommand>, Vec<Port>) {
    let Some(anchor) = ports.iter().find(|p| p.id == entry).copied() else {
        return (commands, ports);
    };
    if anchor.id == PortId::A {
        return (commands, ports);
    }

    let turn = ENTRY_DIRECTION - anchor.direction;
    let map = |p: Point| (p - anchor.position).rotated(turn);

    let commands = commands.iter().map(|c| c.map_points(1.0, &map)).collect();
    let ports = ports
        .iter()
        .map(|p| {
            if p.id == entry {
                // pin exactly, without rounding residue
                Port::new(p.id, Point::zero(), ENTRY_DIRECTION)
            } else {
                Port::new(p.id, map(p.position), p.direction + turn)
            }
        })
        .collect();
    (commands, ports)
}
