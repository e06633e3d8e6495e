//! SVG renderer for track plans and catalog previews
//!
//! Takes immutable plan snapshots (world paths already in pixels) and
//! produces SVG strings with CSS classes for the selection states.

pub mod config;
pub mod svg;

pub use config::SvgConfig;
pub use svg::{render_plan_svg, render_preview_svg, SvgBuilder};
