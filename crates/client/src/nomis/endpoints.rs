//! URL construction for the three API endpoints.
//!
//! The built URL string is the cache key, so construction must be
//! deterministic: parameters are always appended in the same order.

use std::collections::BTreeMap;

use url::Url;

/// Error type for URL construction failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid base URL: {0}")]
    InvalidBase(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Everything a data request needs apart from its page position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQuery {
    pub table_id: String,
    pub geography_types: String,
    pub cell_dimension: String,
    /// Comma-separated cell codes of one chunk.
    pub cell_codes: String,
    /// Comma-separated measure codes.
    pub measure_codes: String,
    pub extra_params: BTreeMap<String, String>,
    pub uid: String,
}

/// Builds endpoint URLs under a common API root.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Parse and check the API root (e.g. `https://www.nomisweb.co.uk/api/v01`).
    pub fn new(base: &str) -> Result<Self, EndpointError> {
        let trimmed = base.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|e| EndpointError::InvalidBase(e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(EndpointError::UnsupportedScheme(scheme.to_string())),
        }

        if parsed.cannot_be_a_base() {
            return Err(EndpointError::InvalidBase(trimmed.to_string()));
        }

        Ok(Self { base: parsed })
    }

    fn path(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// The catalog of every dataset definition.
    pub fn catalog(&self) -> String {
        self.path(&["dataset", "def.sdmx.json"]).into()
    }

    /// The code list of one dimension of a dataset.
    pub fn codelist(&self, table_id: &str, dimension: &str) -> String {
        self.path(&["dataset", table_id, &format!("{dimension}.def.sdmx.json")]).into()
    }

    /// One page of CSV rows for a chunk of cell codes.
    pub fn data(&self, query: &DataQuery, limit: u64, offset: u64) -> String {
        let mut url = self.path(&["dataset", &format!("{}.data.csv", query.table_id)]);
        let cell = query.cell_dimension.to_lowercase();
        let select = format!(
            "date_name,geography_name,geography_code,geography_type,geography_typecode,\
             {cell},{cell}_name,{cell}_type,measures,measures_name,obs_value,obs_status_name"
        );
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("date", "latest")
                .append_pair("geography", &query.geography_types)
                .append_pair(&query.cell_dimension, &query.cell_codes)
                .append_pair("measures", &query.measure_codes);
            for (key, value) in &query.extra_params {
                pairs.append_pair(key, value);
            }
            pairs
                .append_pair("select", &select)
                .append_pair("uid", &query.uid)
                .append_pair("RecordLimit", &limit.to_string())
                .append_pair("RecordOffset", &offset.to_string());
        }
        url.into()
    }
}
