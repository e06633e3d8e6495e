//! Error types for the track geometry engine

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;

/// Coarse classification of [`TrackError`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An article code or segment identifier does not exist
    NotFound,
    /// A caller passed an argument outside its domain
    InvalidArgument,
    /// Catalog data describes geometry that cannot be drawn
    GeometryDegenerate,
    /// Catalog or configuration input could not be loaded
    Configuration,
}

/// Errors that can occur while generating, placing or connecting segments
#[derive(Debug, Error)]
pub enum TrackError {
    /// Article code missing from the catalog
    #[error("unknown article code '{code}'{}", format_suggestions(.suggestions))]
    UnknownArticle {
        code: String,
        suggestions: Vec<String>,
    },

    /// Entry port not defined by the article's shape
    #[error("article '{article}' has no port '{port}' (valid ports: {valid_ports})")]
    UnknownPort {
        article: String,
        port: String,
        valid_ports: String,
    },

    /// Segment identifier not present in the plan
    #[error("no placed segment with id {id}")]
    UnknownSegment { id: u64 },

    /// Transform scale must be a positive finite number
    #[error("invalid scale {scale}: must be positive and finite")]
    InvalidScale { scale: f64 },

    /// Any other argument outside its domain
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Zero-length arcs, coincident endpoints and similar
    #[error("degenerate geometry for '{article}': {reason}")]
    DegenerateGeometry { article: String, reason: String },

    /// Catalog could not be loaded
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Engine configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TrackError {
    /// Create an unknown article error with suggestions
    pub fn unknown_article(code: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::UnknownArticle {
            code: code.into(),
            suggestions,
        }
    }

    /// Create an unknown port error listing the ports that do exist
    pub fn unknown_port(
        article: impl Into<String>,
        port: impl Into<String>,
        valid_ports: &[impl ToString],
    ) -> Self {
        Self::UnknownPort {
            article: article.into(),
            port: port.into(),
            valid_ports: valid_ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn unknown_segment(id: u64) -> Self {
        Self::UnknownSegment { id }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a degenerate geometry error
    pub fn degenerate(article: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            article: article.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownArticle { .. } | Self::UnknownSegment { .. } => ErrorKind::NotFound,
            Self::UnknownPort { .. } | Self::InvalidScale { .. } | Self::InvalidArgument { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::DegenerateGeometry { .. } => ErrorKind::GeometryDegenerate,
            Self::Catalog(_) | Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Get suggestions if available
    pub fn suggestions(&self) -> Option<&[String]> {
        match self {
            Self::UnknownArticle { suggestions, .. } => Some(suggestions),
            _ => None,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}
