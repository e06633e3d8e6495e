//! Planar geometry: points, bounds, path commands, arcs and transforms

pub mod arc;
pub mod path;
pub mod transform;
pub mod types;

pub use arc::ArcGeometry;
pub use path::{Figure, FigureSegment, Path, PathCommand};
pub use transform::{to_world, PreviewFit, WorldTransform};
pub use types::{angular_difference, normalize_degrees, signed_degrees, Bounds, Point};
