//! SVG generation from plan snapshots and catalog shapes

use crate::catalog::SegmentShape;
use crate::config::PreviewBox;
use crate::error::TrackError;
use crate::geometry::path::fmt_coord;
use crate::geometry::{Bounds, Point, PreviewFit};
use crate::layout::{PlanSnapshot, SegmentView, WorldPort};

use super::SvgConfig;

/// Radius of open-port markers in pixels
const PORT_MARKER_RADIUS: f64 = 3.0;
/// Length of the outward tangent tick drawn on port markers
const PORT_TICK_LENGTH: f64 = 8.0;

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    styles: Vec<String>,
    elements: Vec<String>,
    markers: Vec<String>,
    indent: usize,
}

impl SvgBuilder {
    /// Create a new SVG builder
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            styles: vec![],
            elements: vec![],
            markers: vec![],
            indent: 1,
        }
    }

    /// Add the CSS rules for track states
    pub fn add_track_styles(&mut self) {
        let p = self.prefix();
        let normal = fmt_number(self.config.stroke_width);
        let selected = fmt_number(self.config.selected_stroke_width);
        self.styles.push(format!(
            ".{p}track {{ fill: none; stroke: #37474f; stroke-width: {normal}; stroke-linecap: round; }}"
        ));
        self.styles.push(format!(
            ".{p}selected {{ stroke: #1e88e5; stroke-width: {selected}; }}"
        ));
        self.styles
            .push(format!(".{p}ghost {{ opacity: 0.4; stroke-dasharray: 6 4; }}"));
        self.styles.push(format!(".{p}hover {{ stroke: #fb8c00; }}"));
        self.styles.push(format!(".{p}dragging {{ opacity: 0.7; }}"));
        self.styles
            .push(format!(".{p}port {{ fill: #e53935; stroke: #e53935; }}"));
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    /// Add a track path with extra state classes
    pub fn add_track(&mut self, id: Option<&str>, d: &str, classes: &[String], styles: &str) {
        let prefix = self.prefix();
        let id_attr = id.map(|i| format!(r#" id="{}""#, i)).unwrap_or_default();
        let class_list = std::iter::once(format!("{}track", prefix))
            .chain(classes.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        self.elements.push(format!(
            r#"{}<path{} class="{}" d="{}"{}/>"#,
            self.indent_str(),
            id_attr,
            class_list,
            d,
            styles
        ));
    }

    /// Add an open-port marker: a dot plus a tick along the outward tangent
    pub fn add_port_marker(&mut self, position: Point, direction: f64, title: &str) {
        let prefix = self.prefix();
        let tip = position + Point::from_angle(direction) * PORT_TICK_LENGTH;
        self.markers.push(format!(
            r#"{}<g class="{}port"><title>{}</title><circle cx="{}" cy="{}" r="{}"/><line x1="{}" y1="{}" x2="{}" y2="{}"/></g>"#,
            self.indent_str(),
            prefix,
            escape_xml(title),
            fmt_coord(position.x),
            fmt_coord(position.y),
            fmt_number(PORT_MARKER_RADIUS),
            fmt_coord(position.x),
            fmt_coord(position.y),
            fmt_coord(tip.x),
            fmt_coord(tip.y),
        ));
    }

    /// Add a group element with optional ID and classes
    pub fn start_group(&mut self, id: Option<&str>, classes: &[String]) {
        let id_attr = id.map(|i| format!(r#" id="{}""#, i)).unwrap_or_default();
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };

        self.elements
            .push(format!("{}<g{}{}>", self.indent_str(), id_attr, class_attr));
        self.indent += 1;
    }

    /// Close a group element
    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    /// Build the final SVG string
    pub fn build(self, viewbox: Bounds) -> String {
        let padding = self.config.viewbox_padding;
        let vb = viewbox.inflate(padding);

        let nl = self.newline();

        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            fmt_coord(vb.min_x),
            fmt_coord(vb.min_y),
            fmt_coord(vb.width()),
            fmt_coord(vb.height())
        ));
        svg.push_str(nl);

        if !self.styles.is_empty() {
            svg.push_str("  <style>");
            svg.push_str(nl);
            for style in &self.styles {
                svg.push_str("    ");
                svg.push_str(style);
                svg.push_str(nl);
            }
            svg.push_str("  </style>");
            svg.push_str(nl);
        }

        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        // Port markers on top of the track
        for marker in &self.markers {
            svg.push_str(marker);
            svg.push_str(nl);
        }

        svg.push_str("</svg>");

        svg
    }
}

/// Render a plan snapshot, one `<path>` per segment.
///
/// `open_ports` are in millimetres and are only drawn in debug mode.
pub fn render_plan_svg(
    snapshot: &PlanSnapshot,
    open_ports: &[WorldPort],
    config: &SvgConfig,
) -> String {
    let mut builder = SvgBuilder::new(config.clone());
    builder.add_track_styles();

    let prefix = config.class_prefix.clone().unwrap_or_default();
    builder.start_group(Some("track-plan"), &[format!("{}plan", prefix)]);
    for segment in &snapshot.segments {
        render_segment(segment, &prefix, config, &mut builder);
    }
    builder.end_group();

    let mut bounds = snapshot.bounds().unwrap_or_default();
    if config.debug {
        for port in open_ports {
            let position = port.position * snapshot.scale;
            builder.add_port_marker(
                position,
                port.direction,
                &format!("{} port {}", port.segment, port.port),
            );
            bounds = bounds.expand_to_include(position);
        }
    }

    builder.build(bounds)
}

fn render_segment(
    segment: &SegmentView,
    prefix: &str,
    config: &SvgConfig,
    builder: &mut SvgBuilder,
) {
    let mut classes = vec![format!("{}{}", prefix, css_ident(&segment.article))];
    if segment.flags.selected {
        classes.push(format!("{}selected", prefix));
    }
    if segment.flags.ghost {
        classes.push(format!("{}ghost", prefix));
    }
    if segment.flags.hover {
        classes.push(format!("{}hover", prefix));
    }
    if segment.dragging {
        classes.push(format!("{}dragging", prefix));
    }

    let styles = if segment.flags.selected {
        format!(
            r#" stroke-width="{}""#,
            fmt_number(config.selected_stroke_width)
        )
    } else {
        String::new()
    };

    let id = format!("segment-{}", segment.id);
    builder.add_track(Some(&id), &segment.path.to_svg_d(), &classes, &styles);
}

/// Render the fixed-size catalog glyph for a shape
pub fn render_preview_svg(
    shape: &SegmentShape,
    preview: &PreviewBox,
) -> Result<String, TrackError> {
    let fit = PreviewFit::for_bounds(&shape.bounds, preview)?;
    let path = fit.apply_path(&shape.path);

    let config = SvgConfig::new()
        .with_viewbox_padding(0.0)
        .with_standalone(false)
        .with_pretty_print(false);
    let mut builder = SvgBuilder::new(config);
    builder.add_track(
        None,
        &path.to_svg_d(),
        &[],
        r#" fill="none" stroke="currentColor""#,
    );

    Ok(builder.build(Bounds::new(0.0, 0.0, preview.width, preview.height)))
}

/// Format a number without trailing zeros
fn fmt_number(value: f64) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Article codes may contain characters that are not valid in class names
fn css_ident(code: &str) -> String {
    code.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PortId, ShapeLibrary};
    use crate::config::SnapConfig;
    use crate::layout::{open_ports, DisplayFlags, TrackPlan};

    fn plan_with_two_pieces() -> TrackPlan {
        let mut library = ShapeLibrary::default();
        let mut plan = TrackPlan::new();
        let a = plan
            .place(library.default_shape("G231").unwrap(), Point::zero(), 0.0)
            .unwrap();
        plan.attach(library.default_shape("R1").unwrap(), a, PortId::B)
            .unwrap();
        plan
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b"), "a &lt; b");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("\"q\""), "&quot;q&quot;");
    }

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(2.0), "2");
        assert_eq!(fmt_number(1.5), "1.5");
        assert_eq!(fmt_number(0.25), "0.25");
    }

    #[test]
    fn test_css_ident() {
        assert_eq!(css_ident("BWL-R3"), "bwl-r3");
        assert_eq!(css_ident("K 15/x"), "k_15_x");
    }

    #[test]
    fn test_render_plan() {
        let plan = plan_with_two_pieces();
        let snapshot = plan.snapshot(1.0).unwrap();
        let svg = render_plan_svg(&snapshot, &[], &SvgConfig::default());

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"<svg xmlns="http://www.w3.org/2000/svg""#));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(r#"id="segment-1" class="tp-track tp-g231""#));
        assert!(svg.contains("A360.00 360.00 0 0 1"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_selected_segment_is_wider() {
        let mut plan = plan_with_two_pieces();
        let first = plan.ids().next().unwrap();
        plan.select(Some(first)).unwrap();
        let svg = render_plan_svg(&plan.snapshot(1.0).unwrap(), &[], &SvgConfig::default());
        assert!(svg.contains(
            r#"class="tp-track tp-g231 tp-selected" d="M0.00 0.00 L230.93 0.00" stroke-width="4""#
        ));
    }

    #[test]
    fn test_ghost_class() {
        let mut plan = plan_with_two_pieces();
        let first = plan.ids().next().unwrap();
        let flags = DisplayFlags {
            ghost: true,
            ..DisplayFlags::default()
        };
        plan.set_flags(first, flags).unwrap();
        let svg = render_plan_svg(&plan.snapshot(1.0).unwrap(), &[], &SvgConfig::default());
        assert!(svg.contains("tp-ghost\""));
    }

    #[test]
    fn test_open_ports_only_in_debug() {
        let plan = plan_with_two_pieces();
        let snapshot = plan.snapshot(1.0).unwrap();
        let ports = open_ports(&plan, &SnapConfig::default());
        assert_eq!(ports.len(), 2);

        let plain = render_plan_svg(&snapshot, &ports, &SvgConfig::default());
        assert!(!plain.contains("<circle"));

        let debug = render_plan_svg(&snapshot, &ports, &SvgConfig::default().with_debug(true));
        assert_eq!(debug.matches("<circle").count(), 2);
        assert!(debug.contains("<title>1 port A</title>"));
    }

    #[test]
    fn test_empty_plan() {
        let plan = TrackPlan::new();
        let svg = render_plan_svg(
            &plan.snapshot(1.0).unwrap(),
            &[],
            &SvgConfig::default().with_standalone(false),
        );
        assert!(svg.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-20.00 -20.00 40.00 40.00">"#
        ));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_preview_fits_box() {
        let mut library = ShapeLibrary::default();
        let shape = library.default_shape("G231").unwrap();
        let svg = render_preview_svg(&shape, &PreviewBox::default()).unwrap();
        insta::assert_snapshot!(svg, @r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0.00 0.00 40.00 24.00"><path class="tp-track" d="M4.00 12.00 L36.00 12.00" fill="none" stroke="currentColor"/></svg>"#);
    }

    #[test]
    fn test_preview_rejects_tiny_box() {
        let mut library = ShapeLibrary::default();
        let shape = library.default_shape("R1").unwrap();
        assert!(render_preview_svg(&shape, &PreviewBox::new(8.0, 8.0, 4.0)).is_err());
    }
}
