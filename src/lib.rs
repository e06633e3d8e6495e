//! Track Geometry - geometry and topology engine for model-railway track plans
//!
//! This library turns a catalog of parametric track pieces into 2D paths,
//! places them in a shared world frame, discovers which pieces are joined
//! through their ports, and drives drag-and-snap editing of connected groups.
//!
//! # Example
//!
//! ```rust
//! use track_geometry::render_chain;
//!
//! let svg = render_chain(&["G231", "R1", "R1"]).unwrap();
//! assert!(svg.contains("<svg"));
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod renderer;

pub use catalog::{
    Catalog, CatalogError, Hand, Port, PortId, SegmentFamily, SegmentShape, SegmentSpec,
    ShapeLibrary,
};
pub use config::{ConfigError, EngineConfig, InteractionConfig, PreviewBox, SnapConfig};
pub use error::{ErrorKind, TrackError};
pub use geometry::{to_world, Bounds, Path, PathCommand, Point, PreviewFit, WorldTransform};
pub use interaction::{DragController, DragOutcome, DragThreshold, PointerEvent, Viewport};
pub use layout::{
    connected_group, try_find_snap_target, PlanChange, PlanSnapshot, SegmentId, SnapTarget,
    TrackPlan,
};
pub use renderer::{render_plan_svg, render_preview_svg, SvgConfig};

use std::collections::BTreeSet;

/// Configuration for rendering a plan
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Tolerances, interaction and scale settings
    pub engine: EngineConfig,
    /// SVG output configuration
    pub svg: SvgConfig,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine configuration
    pub fn with_engine(mut self, config: EngineConfig) -> Self {
        self.engine = config;
        self
    }

    /// Set the SVG configuration
    pub fn with_svg(mut self, config: SvgConfig) -> Self {
        self.svg = config;
        self
    }

    /// Enable or disable open-port markers
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.svg.debug = debug;
        self
    }
}

/// Lay out articles end to end.
///
/// The first piece sits at the origin facing +x; every following piece
/// enters through port A at the previous piece's first open exit port.
pub fn build_chain(
    library: &mut ShapeLibrary,
    codes: &[&str],
    snap: &SnapConfig,
) -> Result<TrackPlan, TrackError> {
    let mut plan = TrackPlan::new();
    let mut previous: Option<SegmentId> = None;

    for code in codes {
        let shape = library.default_shape(code)?;
        let id = match previous {
            None => plan.place(shape, Point::zero(), 0.0)?,
            Some(prev) => {
                let segment = plan.get(prev)?;
                let entry = segment.entry_port();
                let exit = layout::open_ports(&plan, snap)
                    .into_iter()
                    .find(|p| p.segment == prev && p.port != entry)
                    .map(|p| p.port)
                    .ok_or_else(|| {
                        TrackError::invalid_argument(format!(
                            "{} has no open exit port to attach {} to",
                            segment.article(),
                            code
                        ))
                    })?;
                plan.attach(shape, prev, exit)?
            }
        };
        previous = Some(id);
    }

    tracing::debug!(pieces = plan.len(), "chain built");
    Ok(plan)
}

/// Render a chain of default-catalog articles with default configuration
pub fn render_chain(codes: &[&str]) -> Result<String, TrackError> {
    render_chain_with_config(&mut ShapeLibrary::default(), codes, &RenderConfig::default())
}

/// Render a chain of articles from `library` with custom configuration
///
/// # Example
///
/// ```rust
/// use track_geometry::{render_chain_with_config, RenderConfig, ShapeLibrary, SvgConfig};
///
/// let config = RenderConfig::new()
///     .with_svg(SvgConfig::default().with_viewbox_padding(50.0))
///     .with_debug(true);
///
/// let svg = render_chain_with_config(&mut ShapeLibrary::default(), &["G231", "WR"], &config)
///     .unwrap();
/// assert!(svg.contains("<circle"));
/// ```
pub fn render_chain_with_config(
    library: &mut ShapeLibrary,
    codes: &[&str],
    config: &RenderConfig,
) -> Result<String, TrackError> {
    let plan = build_chain(library, codes, &config.engine.snap)?;
    render_plan(&plan, config)
}

/// Render an existing plan
pub fn render_plan(plan: &TrackPlan, config: &RenderConfig) -> Result<String, TrackError> {
    let snapshot = plan.snapshot(config.engine.render.scale_mm_to_px)?;
    let open = layout::open_ports(plan, &config.engine.snap);
    Ok(render_plan_svg(&snapshot, &open, &config.svg))
}

/// An editing session: catalog, plan, viewport and drag controller together
#[derive(Debug, Clone)]
pub struct TrackEditor {
    library: ShapeLibrary,
    plan: TrackPlan,
    drag: DragController,
    viewport: Viewport,
    config: EngineConfig,
}

impl Default for TrackEditor {
    fn default() -> Self {
        Self::new(ShapeLibrary::default(), EngineConfig::default())
    }
}

impl TrackEditor {
    pub fn new(library: ShapeLibrary, config: EngineConfig) -> Self {
        Self {
            library,
            plan: TrackPlan::new(),
            drag: DragController::new(config),
            viewport: Viewport {
                scale_mm_to_px: config.render.scale_mm_to_px,
                ..Viewport::default()
            },
            config,
        }
    }

    pub fn library(&self) -> &ShapeLibrary {
        &self.library
    }

    pub fn plan(&self) -> &TrackPlan {
        &self.plan
    }

    pub fn plan_mut(&mut self) -> &mut TrackPlan {
        &mut self.plan
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Change pan and zoom; the pixel scale comes from the configuration
    pub fn set_view(&mut self, pan: Point, zoom: f64) -> Result<(), TrackError> {
        self.viewport = Viewport::new(pan, zoom, self.config.render.scale_mm_to_px)?;
        Ok(())
    }

    /// Drop a catalog article onto the canvas
    pub fn place(
        &mut self,
        code: &str,
        entry: PortId,
        origin: Point,
        rotation: f64,
    ) -> Result<SegmentId, TrackError> {
        let shape = self.library.shape(code, entry)?;
        self.plan.place(shape, origin, rotation)
    }

    /// Drop a catalog article onto an existing port
    pub fn attach(
        &mut self,
        code: &str,
        target: SegmentId,
        port: PortId,
    ) -> Result<SegmentId, TrackError> {
        let shape = self.library.default_shape(code)?;
        self.plan.attach(shape, target, port)
    }

    pub fn remove(&mut self, id: SegmentId) -> Result<(), TrackError> {
        self.plan.remove(id).map(|_| ())
    }

    /// Feed a pointer event in screen pixels
    pub fn pointer(&mut self, event: PointerEvent) -> Result<DragOutcome, TrackError> {
        self.drag.handle(&mut self.plan, &self.viewport, event)
    }

    pub fn has_capture(&self) -> bool {
        self.drag.has_capture()
    }

    pub fn connected_group(&self, id: SegmentId) -> Result<BTreeSet<SegmentId>, TrackError> {
        connected_group(&self.plan, id, &self.config.snap)
    }

    pub fn snapshot(&self) -> Result<PlanSnapshot, TrackError> {
        self.plan.snapshot(self.config.render.scale_mm_to_px)
    }

    /// Drain change notifications for the rendering collaborator
    pub fn take_changes(&mut self) -> Vec<PlanChange> {
        self.plan.take_changes()
    }

    pub fn render_svg(&self, svg: &SvgConfig) -> Result<String, TrackError> {
        render_plan(
            &self.plan,
            &RenderConfig::new().with_engine(self.config).with_svg(svg.clone()),
        )
    }
}
