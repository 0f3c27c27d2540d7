//! Dataset descriptors and dimension-shape classification.
//!
//! Every loadable dataset has the fixed dimensions GEOGRAPHY, MEASURES and
//! FREQ, exactly one variable "cell" dimension, and, depending on vintage,
//! one extra qualifier dimension (e.g. an urban/rural split). Anything else
//! is skipped.

use serde::{Deserialize, Serialize};

/// Dimensions every loadable dataset must declare.
pub const FIXED_DIMENSIONS: [&str; 3] = ["GEOGRAPHY", "MEASURES", "FREQ"];

/// A dataset definition taken from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Table code used in API paths (e.g. `NM_1_1`).
    pub table_id: String,
    /// Human-readable table name (e.g. `UV001 - Usual resident population`).
    pub table_name: String,
    /// Declared dimensions, in catalog order.
    pub dimensions: Vec<String>,
    /// Source annotations; carry the `census_{year}` tags.
    pub source_tags: Vec<String>,
}

impl DatasetDescriptor {
    /// Whether any source annotation carries the token `census_{year}`.
    ///
    /// Annotations are split on anything other than ASCII alphanumerics and
    /// `_`, so `census_200` does not match inside `census_2001`.
    pub fn has_year_tag(&self, year: i32) -> bool {
        let tag = format!("census_{year}");
        self.source_tags.iter().any(|t| {
            t.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .any(|token| token == tag)
        })
    }
}

/// Select the descriptors tagged for `year`, preserving order.
pub fn filter_by_year_tag(descriptors: &[DatasetDescriptor], year: i32) -> Vec<&DatasetDescriptor> {
    descriptors.iter().filter(|d| d.has_year_tag(year)).collect()
}

/// An accepted dimension layout: the fixed dimensions, one cell dimension,
/// and optionally one named qualifier dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionShape {
    #[serde(default)]
    pub qualifier: Option<String>,
}

impl DimensionShape {
    /// Fixed dimensions plus a single cell dimension.
    pub fn plain() -> Self {
        Self { qualifier: None }
    }

    /// Fixed dimensions, a cell dimension and the named qualifier.
    pub fn with_qualifier(name: impl Into<String>) -> Self {
        Self { qualifier: Some(name.into()) }
    }

    fn matches(&self, dims: &[String]) -> Option<ShapeMatch> {
        let expected = FIXED_DIMENSIONS.len() + 1 + usize::from(self.qualifier.is_some());
        if dims.len() != expected {
            return None;
        }
        if let Some(q) = &self.qualifier
            && !dims.iter().any(|d| d == q)
        {
            return None;
        }
        let mut rest = dims
            .iter()
            .filter(|d| !FIXED_DIMENSIONS.contains(&d.as_str()) && Some(*d) != self.qualifier.as_ref());
        match (rest.next(), rest.next()) {
            (Some(cell), None) => {
                Some(ShapeMatch { cell_dimension: cell.clone(), qualifier: self.qualifier.clone() })
            }
            _ => None,
        }
    }
}

/// The outcome of a successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMatch {
    pub cell_dimension: String,
    pub qualifier: Option<String>,
}

/// Why a dataset's dimensions were not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("missing required dimension {0}")]
    MissingFixed(&'static str),

    #[error("unexpected dimensions: {}", .0.join(", "))]
    Unrecognized(Vec<String>),
}

/// Classify `dims` against the accepted shapes, first match wins.
pub fn classify(dims: &[String], shapes: &[DimensionShape]) -> Result<ShapeMatch, ShapeError> {
    if let Some(missing) = FIXED_DIMENSIONS.iter().find(|f| !dims.iter().any(|d| d.as_str() == **f)) {
        return Err(ShapeError::MissingFixed(*missing));
    }
    shapes
        .iter()
        .find_map(|shape| shape.matches(dims))
        .ok_or_else(|| ShapeError::Unrecognized(dims.to_vec()))
}
