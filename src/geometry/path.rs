//! Path command model.
//!
//! A segment shape is described by a flat list of [`PathCommand`]s. The list
//! may hold several disjoint sub-paths (a turnout draws its straight route
//! and its diverging route separately), each started by a `MoveTo`.

use super::arc::ArcGeometry;
use super::types::{Bounds, Point};

/// A primitive drawing operation in some coordinate frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Lift the pen and start a new sub-path
    MoveTo(Point),
    /// Straight line from the current point
    LineTo(Point),
    /// Circular arc from the current point
    ArcTo {
        end: Point,
        radius: f64,
        clockwise: bool, // true = clockwise in y-down coordinates
        large_arc: bool,
    },
}

impl PathCommand {
    /// The point the pen ends on after this command
    pub fn end_point(&self) -> Point {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => *p,
            PathCommand::ArcTo { end, .. } => *end,
        }
    }

    /// Apply a point mapping to every coordinate, scaling radii by `radius_scale`
    pub fn map_points(&self, radius_scale: f64, f: impl Fn(Point) -> Point) -> PathCommand {
        match *self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(f(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(f(p)),
            PathCommand::ArcTo {
                end,
                radius,
                clockwise,
                large_arc,
            } => PathCommand::ArcTo {
                end: f(end),
                radius: radius * radius_scale,
                clockwise,
                large_arc,
            },
        }
    }
}

/// A drawable piece of a figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FigureSegment {
    Line { from: Point, to: Point },
    Arc(ArcGeometry),
}

impl FigureSegment {
    /// Bounds of this piece, including arc extrema
    pub fn bounds(&self) -> Bounds {
        match self {
            FigureSegment::Line { from, to } => Bounds::from_point(*from).expand_to_include(*to),
            FigureSegment::Arc(arc) => arc.bounds(),
        }
    }

    /// Polyline approximation with the given maximum chord error
    pub fn flatten(&self, tolerance: f64) -> Vec<Point> {
        match self {
            FigureSegment::Line { from, to } => vec![*from, *to],
            FigureSegment::Arc(arc) => arc.sample(arc.segments_for_tolerance(tolerance)),
        }
    }
}

/// One sub-path with its start point and drawable segments.
///
/// Figures are always closed out: a new `MoveTo` or the end of the command
/// stream ends the current figure, and a figure without segments is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub start: Point,
    pub segments: Vec<FigureSegment>,
}

/// An ordered command sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub commands: Vec<PathCommand>,
}

impl Path {
    pub fn new(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Split the commands into explicit figures.
    ///
    /// A stream that does not begin with `MoveTo` implicitly starts at the
    /// origin. Arcs whose radius is not positive, or which cannot reach their
    /// end point, degrade to straight lines. Zero-length pieces are skipped.
    pub fn figures(&self) -> Vec<Figure> {
        let mut figures = Vec::new();
        let mut current = Figure {
            start: Point::zero(),
            segments: Vec::new(),
        };
        let mut pen = Point::zero();

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    close_out(&mut figures, &mut current, p);
                    pen = p;
                }
                PathCommand::LineTo(p) => {
                    if p != pen {
                        current
                            .segments
                            .push(FigureSegment::Line { from: pen, to: p });
                    }
                    pen = p;
                }
                PathCommand::ArcTo {
                    end,
                    radius,
                    clockwise,
                    large_arc,
                } => {
                    match ArcGeometry::resolve(pen, end, radius, clockwise, large_arc) {
                        Some(arc) => current.segments.push(FigureSegment::Arc(arc)),
                        None if end != pen => current
                            .segments
                            .push(FigureSegment::Line { from: pen, to: end }),
                        None => {}
                    }
                    pen = end;
                }
            }
        }
        close_out(&mut figures, &mut current, pen);
        figures
    }

    /// Axis-aligned bounds covering every drawn point, arc extrema included.
    ///
    /// Pen positions set by `MoveTo` count as drawn points, so a shape's
    /// ports are always inside its bounds. An empty path yields the
    /// zero box at the origin.
    pub fn bounds(&self) -> Bounds {
        let mut bounds: Option<Bounds> = None;
        let mut include = |b: Bounds| {
            bounds = Some(match bounds {
                Some(acc) => acc.union(&b),
                None => b,
            });
        };

        if !matches!(self.commands.first(), Some(PathCommand::MoveTo(_)) | None) {
            include(Bounds::from_point(Point::zero()));
        }
        for figure in self.figures() {
            include(Bounds::from_point(figure.start));
            for seg in &figure.segments {
                include(seg.bounds());
            }
        }
        for cmd in &self.commands {
            if let PathCommand::MoveTo(p) = cmd {
                include(Bounds::from_point(*p));
            }
        }

        bounds.unwrap_or_default()
    }

    /// Polylines approximating each figure within `tolerance`
    pub fn flatten(&self, tolerance: f64) -> Vec<Vec<Point>> {
        self.figures()
            .iter()
            .map(|figure| {
                let mut points = vec![figure.start];
                for seg in &figure.segments {
                    points.extend(seg.flatten(tolerance).into_iter().skip(1));
                }
                points
            })
            .collect()
    }

    /// Convert to SVG path `d` attribute string
    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();

        for figure in self.figures() {
            if !d.is_empty() {
                d.push(' ');
            }
            d.push_str(&format!("M{} {}", fmt_coord(figure.start.x), fmt_coord(figure.start.y)));
            for seg in &figure.segments {
                match seg {
                    FigureSegment::Line { to, .. } => {
                        d.push_str(&format!(" L{} {}", fmt_coord(to.x), fmt_coord(to.y)));
                    }
                    FigureSegment::Arc(arc) => {
                        let large = if arc.sweep.abs() > std::f64::consts::PI { 1 } else { 0 };
                        let sw = if arc.sweep >= 0.0 { 1 } else { 0 };
                        // SVG arc: A rx ry x-axis-rotation large-arc-flag sweep-flag x y
                        d.push_str(&format!(
                            " A{} {} 0 {} {} {} {}",
                            fmt_coord(arc.radius),
                            fmt_coord(arc.radius),
                            large,
                            sw,
                            fmt_coord(arc.end.x),
                            fmt_coord(arc.end.y)
                        ));
                    }
                }
            }
        }

        d
    }
}

impl From<Vec<PathCommand>> for Path {
    fn from(commands: Vec<PathCommand>) -> Self {
        Self::new(commands)
    }
}

fn close_out(figures: &mut Vec<Figure>, current: &mut Figure, next_start: Point) {
    let finished = std::mem::replace(
        current,
        Figure {
            start: next_start,
            segments: Vec::new(),
        },
    );
    if !finished.segments.is_empty() {
        figures.push(finished);
    }
}

/// Format a coordinate with two decimals, without a negative zero
pub(crate) fn fmt_coord(value: f64) -> String {
    let s = format!("{:.2}", value);
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_curve() -> Path {
        Path::new(vec![
            PathCommand::MoveTo(Point::zero()),
            PathCommand::ArcTo {
                end: Point::new(30.0, 30.0),
                radius: 30.0,
                clockwise: true,
                large_arc: false,
            },
        ])
    }

    #[test]
    fn test_figures_split_on_move_to() {
        let path = Path::new(vec![
            PathCommand::MoveTo(Point::zero()),
            PathCommand::LineTo(Point::new(100.0, 0.0)),
            PathCommand::MoveTo(Point::zero()),
            PathCommand::LineTo(Point::new(0.0, 50.0)),
        ]);
        let figures = path.figures();
        assert_eq!(figures.len(), 2);
        assert_eq!(figures[1].start, Point::zero());
        assert_eq!(figures[1].segments.len(), 1);
    }

    #[test]
    fn test_implicit_start_at_origin() {
        let path = Path::new(vec![PathCommand::LineTo(Point::new(10.0, 0.0))]);
        let figures = path.figures();
        assert_eq!(figures.len(), 1);
        assert_eq!(figures[0].start, Point::zero());
    }

    #[test]
    fn test_empty_figures_are_dropped() {
        let path = Path::new(vec![
            PathCommand::MoveTo(Point::new(5.0, 5.0)),
            PathCommand::MoveTo(Point::zero()),
            PathCommand::LineTo(Point::new(1.0, 0.0)),
            PathCommand::MoveTo(Point::new(9.0, 9.0)),
        ]);
        assert_eq!(path.figures().len(), 1);
    }

    #[test]
    fn test_zero_radius_arc_degrades_to_line() {
        let path = Path::new(vec![
            PathCommand::MoveTo(Point::zero()),
            PathCommand::ArcTo {
                end: Point::new(10.0, 0.0),
                radius: 0.0,
                clockwise: true,
                large_arc: false,
            },
        ]);
        let figures = path.figures();
        assert!(matches!(figures[0].segments[0], FigureSegment::Line { .. }));
    }

    #[test]
    fn test_quarter_arc_bounds() {
        let b = quarter_curve().bounds();
        let expected = Bounds::new(0.0, 0.0, 30.0, 30.0);
        for (got, want) in [
            (b.min_x, expected.min_x),
            (b.min_y, expected.min_y),
            (b.max_x, expected.max_x),
            (b.max_y, expected.max_y),
        ] {
            assert!((got - want).abs() < 1e-9, "bounds {:?}", b);
        }
    }

    #[test]
    fn test_empty_path_bounds() {
        assert_eq!(Path::default().bounds(), Bounds::zero());
    }

    #[test]
    fn test_svg_d_output() {
        let path = Path::new(vec![
            PathCommand::MoveTo(Point::zero()),
            PathCommand::LineTo(Point::new(100.0, 0.0)),
            PathCommand::MoveTo(Point::zero()),
            PathCommand::ArcTo {
                end: Point::new(30.0, 30.0),
                radius: 30.0,
                clockwise: true,
                large_arc: false,
            },
        ]);
        insta::assert_snapshot!(path.to_svg_d(), @"M0.00 0.00 L100.00 0.00 M0.00 0.00 A30.00 30.00 0 0 1 30.00 30.00");
    }

    #[test]
    fn test_svg_d_has_no_negative_zero() {
        let path = Path::new(vec![
            PathCommand::MoveTo(Point::new(-0.0001, 0.0)),
            PathCommand::LineTo(Point::new(10.0, -0.0001)),
        ]);
        assert_eq!(path.to_svg_d(), "M0.00 0.00 L10.00 0.00");
    }

    #[test]
    fn test_flatten_follows_arc() {
        let polylines = quarter_curve().flatten(0.01);
        assert_eq!(polylines.len(), 1);
        let line = &polylines[0];
        assert_eq!(line.first().copied(), Some(Point::zero()));
        assert_eq!(line.last().copied(), Some(Point::new(30.0, 30.0)));
        for p in line {
            assert!((p.distance(Point::new(0.0, 30.0)) - 30.0).abs() < 1e-9);
        }
    }
}
