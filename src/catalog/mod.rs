//! Track catalog: article codes mapped to parametric segment families.
//!
//! A catalog is plain data loaded from TOML. The built-in catalog describes
//! the Piko A H0 range; alternative catalogs can be loaded from a file or
//! extended at runtime with [`Catalog::register`].
//!
//! ```toml
//! [metadata]
//! name = "My layout pieces"
//!
//! [[segment]]
//! code = "G100"
//! name = "Straight 100 mm"
//! kind = "straight"
//! length = 100.0
//! ```

pub mod library;
pub mod shape;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::TrackError;

pub use library::ShapeLibrary;
pub use shape::{generate_shape, get_bounds, get_path, Port, PortId, SegmentShape};

/// Errors that can occur when loading or extending a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse catalog TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Duplicate article code '{0}'")]
    DuplicateCode(String),
    #[error("Invalid article '{code}': {reason}")]
    Invalid { code: String, reason: String },
}

/// Which way a curve or diverging route bends, seen from the entry port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    #[default]
    Right,
}

impl Hand {
    /// +1 for right (towards +y in screen coordinates), -1 for left
    pub fn sign(self) -> f64 {
        match self {
            Hand::Left => -1.0,
            Hand::Right => 1.0,
        }
    }
}

/// Parametric shape family with its dimensions in millimetres and degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentFamily {
    Straight {
        length: f64,
    },
    Curve {
        radius: f64,
        angle: f64,
        #[serde(default)]
        hand: Hand,
    },
    /// Simple switch: straight route plus one diverging arc
    Turnout {
        length: f64,
        radius: f64,
        angle: f64,
        hand: Hand,
    },
    /// Straight route with diverging arcs to both sides
    ThreeWay {
        length: f64,
        radius: f64,
        angle: f64,
    },
    /// Symmetric switch, both routes diverge
    YSwitch {
        radius: f64,
        angle: f64,
    },
    /// Curved switch: two arcs of different radius tangent at the entry
    CurvedTurnout {
        inner_radius: f64,
        outer_radius: f64,
        angle: f64,
        hand: Hand,
    },
    /// Two straights crossing at their midpoints
    Crossing {
        length: f64,
        angle: f64,
    },
    /// Crossing with slip arcs connecting A to D and C to B
    DoubleSlip {
        length: f64,
        angle: f64,
    },
}

/// Discriminant of [`SegmentFamily`], used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyKind {
    Straight,
    Curve,
    Turnout,
    ThreeWay,
    YSwitch,
    CurvedTurnout,
    Crossing,
    DoubleSlip,
}

impl std::fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FamilyKind::Straight => "straight",
            FamilyKind::Curve => "curve",
            FamilyKind::Turnout => "turnout",
            FamilyKind::ThreeWay => "three_way",
            FamilyKind::YSwitch => "y_switch",
            FamilyKind::CurvedTurnout => "curved_turnout",
            FamilyKind::Crossing => "crossing",
            FamilyKind::DoubleSlip => "double_slip",
        };
        f.write_str(name)
    }
}

impl SegmentFamily {
    pub fn kind(&self) -> FamilyKind {
        match self {
            SegmentFamily::Straight { .. } => FamilyKind::Straight,
            SegmentFamily::Curve { .. } => FamilyKind::Curve,
            SegmentFamily::Turnout { .. } => FamilyKind::Turnout,
            SegmentFamily::ThreeWay { .. } => FamilyKind::ThreeWay,
            SegmentFamily::YSwitch { .. } => FamilyKind::YSwitch,
            SegmentFamily::CurvedTurnout { .. } => FamilyKind::CurvedTurnout,
            SegmentFamily::Crossing { .. } => FamilyKind::Crossing,
            SegmentFamily::DoubleSlip { .. } => FamilyKind::DoubleSlip,
        }
    }

    /// Ports defined by this family, in name order
    pub fn port_ids(&self) -> &'static [PortId] {
        const TWO: [PortId; 2] = [PortId::A, PortId::B];
        const THREE: [PortId; 3] = [PortId::A, PortId::B, PortId::C];
        const FOUR: [PortId; 4] = [PortId::A, PortId::B, PortId::C, PortId::D];
        match self {
            SegmentFamily::Straight { .. } | SegmentFamily::Curve { .. } => &TWO,
            SegmentFamily::Turnout { .. }
            | SegmentFamily::YSwitch { .. }
            | SegmentFamily::CurvedTurnout { .. } => &THREE,
            SegmentFamily::ThreeWay { .. }
            | SegmentFamily::Crossing { .. }
            | SegmentFamily::DoubleSlip { .. } => &FOUR,
        }
    }

    /// Check that the dimensions describe drawable geometry
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            SegmentFamily::Straight { length } => positive("length", length),
            SegmentFamily::Curve { radius, angle, .. } => {
                positive("radius", radius)?;
                arc_angle(angle)
            }
            SegmentFamily::Turnout {
                length,
                radius,
                angle,
                ..
            }
            | SegmentFamily::ThreeWay {
                length,
                radius,
                angle,
            } => {
                positive("length", length)?;
                positive("radius", radius)?;
                arc_angle(angle)
            }
            SegmentFamily::YSwitch { radius, angle } => {
                positive("radius", radius)?;
                arc_angle(angle)
            }
            SegmentFamily::CurvedTurnout {
                inner_radius,
                outer_radius,
                angle,
                ..
            } => {
                positive("inner_radius", inner_radius)?;
                positive("outer_radius", outer_radius)?;
                arc_angle(angle)?;
                if inner_radius >= outer_radius {
                    return Err(format!(
                        "inner_radius {} must be smaller than outer_radius {}",
                        inner_radius, outer_radius
                    ));
                }
                Ok(())
            }
            SegmentFamily::Crossing { length, angle }
            | SegmentFamily::DoubleSlip { length, angle } => {
                positive("length", length)?;
                if !(angle.is_finite() && angle > 0.0 && angle < 90.0) {
                    return Err(format!("crossing angle {} must lie in (0, 90)", angle));
                }
                Ok(())
            }
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} {} must be positive", name, value))
    }
}

fn arc_angle(angle: f64) -> Result<(), String> {
    if angle.is_finite() && angle > 0.0 && angle <= 180.0 {
        Ok(())
    } else {
        Err(format!("arc angle {} must lie in (0, 180]", angle))
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SegmentSpec {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub family: SegmentFamily,
}

impl SegmentSpec {
    pub fn new(code: impl Into<String>, name: impl Into<String>, family: SegmentFamily) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            family,
        }
    }
}

/// TOML structure for deserializing catalogs
#[derive(Deserialize)]
struct TomlCatalog {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    segment: Vec<SegmentSpec>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

/// Piko A H0 track range
const DEFAULT_CATALOG: &str = r##"
[metadata]
name = "Piko A H0"
description = "Piko A-Gleis with 16.5 mm gauge and 61.88 mm parallel spacing"

# Straights
[[segment]]
code = "G239"
name = "Straight 239 mm"
kind = "straight"
length = 239.07

[[segment]]
code = "G231"
name = "Straight 231 mm"
kind = "straight"
length = 230.93

[[segment]]
code = "G119"
name = "Straight 119 mm"
kind = "straight"
length = 119.54

[[segment]]
code = "G115"
name = "Straight 115 mm"
kind = "straight"
length = 115.46

[[segment]]
code = "G107"
name = "Straight 107 mm"
kind = "straight"
length = 107.32

[[segment]]
code = "G62"
name = "Straight 62 mm"
kind = "straight"
length = 61.88

[[segment]]
code = "G940"
name = "Flex straight 940 mm"
kind = "straight"
length = 940.0

# Curves
[[segment]]
code = "R1"
name = "Curve R1 30°"
kind = "curve"
radius = 360.0
angle = 30.0

[[segment]]
code = "R2"
name = "Curve R2 30°"
kind = "curve"
radius = 421.88
angle = 30.0

[[segment]]
code = "R3"
name = "Curve R3 30°"
kind = "curve"
radius = 483.75
angle = 30.0

[[segment]]
code = "R4"
name = "Curve R4 30°"
kind = "curve"
radius = 545.63
angle = 30.0

[[segment]]
code = "R9"
name = "Curve R9 15°"
kind = "curve"
radius = 907.97
angle = 15.0

# Switches
[[segment]]
code = "WL"
name = "Turnout left 15°"
kind = "turnout"
length = 239.07
radius = 907.97
angle = 15.0
hand = "left"

[[segment]]
code = "WR"
name = "Turnout right 15°"
kind = "turnout"
length = 239.07
radius = 907.97
angle = 15.0
hand = "right"

[[segment]]
code = "W3"
name = "Three-way turnout 15°"
kind = "three_way"
length = 239.07
radius = 907.97
angle = 15.0

[[segment]]
code = "WY"
name = "Y turnout"
kind = "y_switch"
radius = 907.97
angle = 15.0

[[segment]]
code = "BWL"
name = "Curved turnout left R2/R3"
kind = "curved_turnout"
inner_radius = 421.88
outer_radius = 483.75
angle = 30.0
hand = "left"

[[segment]]
code = "BWR"
name = "Curved turnout right R2/R3"
kind = "curved_turnout"
inner_radius = 421.88
outer_radius = 483.75
angle = 30.0
hand = "right"

[[segment]]
code = "BWL-R3"
name = "Curved turnout left R3/R4"
kind = "curved_turnout"
inner_radius = 483.75
outer_radius = 545.63
angle = 30.0
hand = "left"

[[segment]]
code = "BWR-R3"
name = "Curved turnout right R3/R4"
kind = "curved_turnout"
inner_radius = 483.75
outer_radius = 545.63
angle = 30.0
hand = "right"

# Crossings
[[segment]]
code = "K15"
name = "Crossing 15°"
kind = "crossing"
length = 239.07
angle = 15.0

[[segment]]
code = "K30"
name = "Crossing 30°"
kind = "crossing"
length = 119.54
angle = 30.0

[[segment]]
code = "DKW"
name = "Double slip 15°"
kind = "double_slip"
length = 239.07
angle = 15.0
"##;

/// A table of article codes, kept in load order
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Optional name for the catalog
    pub name: Option<String>,
    /// Optional description
    pub description: Option<String>,
    entries: Vec<SegmentSpec>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// An empty catalog
    pub fn empty() -> Self {
        Self {
            name: None,
            description: None,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a catalog from a TOML string.
    ///
    /// Every entry is validated eagerly; duplicate codes are rejected.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, CatalogError> {
        let parsed: TomlCatalog = toml::from_str(content)?;

        let mut catalog = Catalog {
            name: parsed.metadata.as_ref().and_then(|m| m.name.clone()),
            description: parsed.metadata.as_ref().and_then(|m| m.description.clone()),
            ..Catalog::empty()
        };
        for spec in parsed.segment {
            if catalog.contains(&spec.code) {
                return Err(CatalogError::DuplicateCode(spec.code));
            }
            catalog.register(spec)?;
        }

        tracing::debug!(
            name = catalog.name.as_deref().unwrap_or("unnamed"),
            entries = catalog.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Add or replace an entry, returning the replaced one
    pub fn register(&mut self, spec: SegmentSpec) -> Result<Option<SegmentSpec>, CatalogError> {
        if let Err(reason) = spec.family.validate() {
            tracing::warn!(code = %spec.code, %reason, "rejected catalog entry");
            return Err(CatalogError::Invalid {
                code: spec.code,
                reason,
            });
        }
        match self.index.get(&spec.code) {
            Some(&i) => Ok(Some(std::mem::replace(&mut self.entries[i], spec))),
            None => {
                self.index.insert(spec.code.clone(), self.entries.len());
                self.entries.push(spec);
                Ok(None)
            }
        }
    }

    /// Look up an article, suggesting close matches when it is missing
    pub fn get(&self, code: &str) -> Result<&SegmentSpec, TrackError> {
        match self.index.get(code) {
            Some(&i) => Ok(&self.entries[i]),
            None => Err(TrackError::unknown_article(
                code,
                find_similar(self.codes(), code, 2),
            )),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in load order
    pub fn iter(&self) -> impl Iterator<Item = &SegmentSpec> {
        self.entries.iter()
    }

    /// Article codes in load order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.code.as_str())
    }

    /// Entries of one family
    pub fn by_kind(&self, kind: FamilyKind) -> impl Iterator<Item = &SegmentSpec> {
        self.entries.iter().filter(move |s| s.family.kind() == kind)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_str(DEFAULT_CATALOG).expect("Default catalog should be valid TOML")
    }
}

/// Length of the centerline of an arc, in millimetres
pub fn arc_length(radius: f64, angle_degrees: f64) -> f64 {
    radius * angle_degrees.to_radians()
}

/// How many pieces of the given arc angle close a full circle, if whole
pub fn pieces_for_full_circle(angle_degrees: f64) -> Option<u32> {
    if !(angle_degrees.is_finite() && angle_degrees > 0.0) {
        return None;
    }
    let pieces = 360.0 / angle_degrees;
    let rounded = pieces.round();
    if (pieces - rounded).abs() < 1e-9 {
        Some(rounded as u32)
    } else {
        None
    }
}

/// Calculate Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut row = vec![0usize; n + 1];
    for (i, ca) in a_chars.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[n]
}

/// Known codes within `max_distance` edits of `target`, closest first
fn find_similar<'a>(
    known: impl Iterator<Item = &'a str>,
    target: &str,
    max_distance: usize,
) -> Vec<String> {
    let target = target.to_uppercase();
    let mut candidates: Vec<(&str, usize)> = known
        .filter_map(|code| {
            let dist = levenshtein_distance(&code.to_uppercase(), &target);
            (dist <= max_distance).then_some((code, dist))
        })
        .collect();

    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    candidates
        .into_iter()
        .map(|(code, _)| code.to_string())
        .take(3)
        .collect()
}
