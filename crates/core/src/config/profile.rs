//! Per-year load profiles.
//!
//! Each census vintage needs slightly different handling: which table
//! families to load, which dimension layouts are valid, how many cell codes
//! fit in one request, and any extra query parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetDescriptor, DimensionShape};

/// Geography types requested by default (local authorities and wards).
pub const DEFAULT_GEOGRAPHY_TYPES: &str = "TYPE464,TYPE480,TYPE499";

/// Which catalog entries a profile loads.
///
/// A descriptor is selected when its name starts with one of `prefixes` or
/// equals one of `names`. With both lists empty, everything is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSelection {
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl TableSelection {
    pub fn matches(&self, descriptor: &DatasetDescriptor) -> bool {
        if self.prefixes.is_empty() && self.names.is_empty() {
            return true;
        }
        self.prefixes.iter().any(|p| descriptor.table_name.starts_with(p.as_str()))
            || self.names.iter().any(|n| descriptor.table_name == *n)
    }
}

/// Load settings for one census year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearProfile {
    /// Census year; also the `census_{year}` catalog tag.
    pub year: i32,

    /// Table families to load.
    #[serde(default)]
    pub selection: TableSelection,

    /// Accepted dimension layouts, tried in order.
    #[serde(default = "default_shapes")]
    pub shapes: Vec<DimensionShape>,

    /// Number of cell codes combined into one data request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Comma-separated geography type codes.
    #[serde(default = "default_geography_types")]
    pub geography_types: String,

    /// Values pinning qualifier dimensions, keyed by dimension name
    /// (case-insensitive). A pin is only sent for datasets matched through a
    /// shape with that qualifier.
    #[serde(default)]
    pub extra_params: BTreeMap<String, String>,
}

fn default_shapes() -> Vec<DimensionShape> {
    vec![DimensionShape::plain()]
}

fn default_chunk_size() -> usize {
    10
}

fn default_geography_types() -> String {
    DEFAULT_GEOGRAPHY_TYPES.into()
}

impl YearProfile {
    /// A profile for `year` with default shapes, chunk size and geography types.
    pub fn new(year: i32, selection: TableSelection) -> Self {
        Self {
            year,
            selection,
            shapes: default_shapes(),
            chunk_size: default_chunk_size(),
            geography_types: default_geography_types(),
            extra_params: BTreeMap::new(),
        }
    }

    /// The query parameter pinning `qualifier`, if the profile sets one.
    pub fn qualifier_pin(&self, qualifier: &str) -> Option<(&str, &str)> {
        self.extra_params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(qualifier))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// The reference deployment: 2001 univariate and key-statistics tables,
    /// then the 1991 local base statistics.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(2001, TableSelection { prefixes: vec!["UV".into(), "KS".into()], names: Vec::new() }),
            Self::new(
                1991,
                TableSelection { prefixes: Vec::new(), names: vec!["1991 census - local base statistics".into()] },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> DatasetDescriptor {
        DatasetDescriptor {
            table_id: "NM_1_1".into(),
            table_name: name.into(),
            dimensions: Vec::new(),
            source_tags: Vec::new(),
        }
    }

    #[test]
    fn test_selection_by_prefix() {
        let selection = TableSelection { prefixes: vec!["UV".into(), "KS".into()], names: Vec::new() };
        assert!(selection.matches(&named("UV001 - Usual resident population")));
        assert!(selection.matches(&named("KS101 - Age")));
        assert!(!selection.matches(&named("ST001 - Age by sex")));
    }

    #[test]
    fn test_selection_by_exact_name() {
        let selection =
            TableSelection { prefixes: Vec::new(), names: vec!["1991 census - local base statistics".into()] };
        assert!(selection.matches(&named("1991 census - local base statistics")));
        assert!(!selection.matches(&named("1991 census - small area statistics")));
    }

    #[test]
    fn test_empty_selection_matches_all() {
        assert!(TableSelection::default().matches(&named("anything")));
    }

    #[test]
    fn test_default_profiles() {
        let profiles = YearProfile::defaults();
        assert_eq!(profiles.iter().map(|p| p.year).collect::<Vec<_>>(), [2001, 1991]);
        assert!(profiles.iter().all(|p| p.chunk_size == 10));
        assert!(profiles.iter().all(|p| p.geography_types == DEFAULT_GEOGRAPHY_TYPES));
    }

    #[test]
    fn test_profile_from_toml_uses_defaults() {
        let profile: YearProfile = toml_profile(
            r#"
            year = 2011
            chunk_size = 20
            [selection]
            prefixes = ["QS"]
            [[shapes]]
            [[shapes]]
            qualifier = "RURAL_URBAN"
            [extra_params]
            rural_urban = "0"
            "#,
        );
        assert_eq!(profile.year, 2011);
        assert_eq!(profile.chunk_size, 20);
        assert_eq!(profile.shapes, vec![DimensionShape::plain(), DimensionShape::with_qualifier("RURAL_URBAN")]);
        assert_eq!(profile.extra_params.get("rural_urban").map(String::as_str), Some("0"));
        assert_eq!(profile.geography_types, DEFAULT_GEOGRAPHY_TYPES);
    }

    #[test]
    fn test_qualifier_pin_ignores_case() {
        let mut profile = YearProfile::new(2011, TableSelection::default());
        assert_eq!(profile.qualifier_pin("RURAL_URBAN"), None);

        profile.extra_params.insert("rural_urban".into(), "0".into());
        assert_eq!(profile.qualifier_pin("RURAL_URBAN"), Some(("rural_urban", "0")));
        assert_eq!(profile.qualifier_pin("C_SEX"), None);
    }

    fn toml_profile(source: &str) -> YearProfile {
        use figment::{Figment, providers::{Format, Toml}};
        Figment::from(Toml::string(source)).extract().unwrap()
    }
}
