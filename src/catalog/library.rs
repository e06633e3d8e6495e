//! Cached shape lookup.
//!
//! Shapes are pure functions of (article, entry port), so the library
//! generates each one once and hands out shared references afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TrackError;

use super::shape::{generate_shape, PortId, SegmentShape};
use super::{Catalog, CatalogError, SegmentSpec};

/// A catalog plus a cache of generated shapes
#[derive(Debug, Clone, Default)]
pub struct ShapeLibrary {
    catalog: Catalog,
    cache: HashMap<(String, PortId), Arc<SegmentShape>>,
}

impl ShapeLibrary {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            cache: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shape for `code` entered through `entry`, generated on first use
    pub fn shape(&mut self, code: &str, entry: PortId) -> Result<Arc<SegmentShape>, TrackError> {
        if let Some(shape) = self.cache.get(&(code.to_string(), entry)) {
            return Ok(Arc::clone(shape));
        }
        let spec = self.catalog.get(code)?;
        let shape = Arc::new(generate_shape(spec, entry)?);
        tracing::trace!(code, %entry, "generated shape");
        self.cache
            .insert((code.to_string(), entry), Arc::clone(&shape));
        Ok(shape)
    }

    /// Shape entered through port A
    pub fn default_shape(&mut self, code: &str) -> Result<Arc<SegmentShape>, TrackError> {
        self.shape(code, PortId::A)
    }

    /// Add or replace a catalog entry, dropping stale cached shapes
    pub fn register(&mut self, spec: SegmentSpec) -> Result<(), CatalogError> {
        let code = spec.code.clone();
        self.catalog.register(spec)?;
        self.cache.retain(|(cached, _), _| *cached != code);
        Ok(())
    }

    /// Number of shapes currently cached
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
