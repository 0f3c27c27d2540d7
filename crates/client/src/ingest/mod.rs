//! Ingestion pipeline: catalog → codes → chunks → pages → store.
//!
//! Datasets are processed one at a time in catalog order; within a dataset,
//! cell-code chunks are processed in code order, and each chunk's pages in
//! offset order. Nothing runs concurrently.
//!
//! Every write is an insert-or-ignore committed on its own, so a failed run
//! can simply be started again.

use std::collections::BTreeMap;

use census_core::dataset::classify;
use census_core::{CellMeta, CensusDb, DatasetDescriptor, Error, ShapeError, TableMeta, YearProfile};

use crate::fetch::PageSource;
use crate::nomis::{Catalog, Code, DataQuery, NomisApi, PagedRetriever, RetrievalStats};

/// Dimension holding the measure codes.
const MEASURES_DIMENSION: &str = "MEASURES";

/// Split `codes` into groups of at most `size`, preserving order.
pub fn chunk_codes(codes: &[Code], size: usize) -> Vec<&[Code]> {
    codes.chunks(size.max(1)).collect()
}

/// What happened to one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Dimensions did not match any accepted shape; nothing was written.
    Skipped { table_id: String, reason: ShapeError },
    /// Rows were retrieved and stored.
    Loaded(DatasetStats),
}

/// Counters for one loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStats {
    pub table_id: String,
    pub cell_dimension: String,
    pub cells: u64,
    pub chunks: u64,
    pub rows: RetrievalStats,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub loaded: u64,
    pub skipped: u64,
    pub rows: RetrievalStats,
}

impl RunSummary {
    fn record(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Skipped { .. } => self.skipped += 1,
            IngestOutcome::Loaded(stats) => {
                self.loaded += 1;
                self.rows += stats.rows;
            }
        }
    }
}

/// Loads datasets from the API into the census store.
pub struct Pipeline<S> {
    api: NomisApi<S>,
    store: CensusDb,
    uid: String,
    record_limit: u64,
}

impl<S: PageSource> Pipeline<S> {
    /// Create a pipeline.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingCredential` if `uid` is blank, before any
    /// request can be made, and `Error::InvalidInput` for a zero record limit.
    pub fn new(api: NomisApi<S>, store: CensusDb, uid: &str, record_limit: u64) -> Result<Self, Error> {
        if uid.trim().is_empty() {
            return Err(Error::MissingCredential("an API uid is required for data requests".into()));
        }
        if record_limit == 0 {
            return Err(Error::InvalidInput("record limit must be greater than 0".into()));
        }
        Ok(Self { api, store, uid: uid.to_string(), record_limit })
    }

    pub fn api(&self) -> &NomisApi<S> {
        &self.api
    }

    pub fn store(&self) -> &CensusDb {
        &self.store
    }

    /// Load one dataset for the profile's year.
    ///
    /// A dataset whose dimensions match none of the profile's shapes is
    /// skipped with a diagnostic and leaves the store untouched.
    pub async fn ingest(&self, profile: &YearProfile, dataset: &DatasetDescriptor) -> Result<IngestOutcome, Error> {
        let shape = match classify(&dataset.dimensions, &profile.shapes) {
            Ok(shape) => shape,
            Err(reason) => {
                tracing::info!(
                    table_id = %dataset.table_id,
                    %reason,
                    "skipping {}; unexpected dimensions",
                    dataset.table_name
                );
                return Ok(IngestOutcome::Skipped { table_id: dataset.table_id.clone(), reason });
            }
        };

        let mut extra_params = BTreeMap::new();
        if let Some(qualifier) = &shape.qualifier {
            let Some((key, value)) = profile.qualifier_pin(qualifier) else {
                return Err(Error::InvalidInput(format!(
                    "{}: qualifier {qualifier} has no pinned value in the {} profile",
                    dataset.table_id, profile.year
                )));
            };
            extra_params.insert(key.to_string(), value.to_string());
        }

        tracing::info!(table_id = %dataset.table_id, year = profile.year, "loading {}", dataset.table_name);

        self.store
            .insert_table(&TableMeta {
                table_id: dataset.table_id.clone(),
                table_name: dataset.table_name.clone(),
                year: profile.year,
            })
            .await?;

        let cells = self.api.codes(&dataset.table_id, &shape.cell_dimension).await?;
        self.store
            .insert_cells(
                cells
                    .codes()
                    .iter()
                    .map(|code| CellMeta {
                        table_id: dataset.table_id.clone(),
                        cell_id: code.value.clone(),
                        cell_name: code.description.clone(),
                    })
                    .collect(),
            )
            .await?;

        let measures = self.api.codes(&dataset.table_id, MEASURES_DIMENSION).await?;
        let measure_codes = measures.joined();

        let retriever = PagedRetriever::new(&self.api, &self.store, self.record_limit)?;
        let chunks = chunk_codes(cells.codes(), profile.chunk_size);
        let mut rows = RetrievalStats::default();

        for (index, chunk) in chunks.iter().enumerate() {
            let query = DataQuery {
                table_id: dataset.table_id.clone(),
                geography_types: profile.geography_types.clone(),
                cell_dimension: shape.cell_dimension.clone(),
                cell_codes: chunk.iter().map(|c| c.value.as_str()).collect::<Vec<_>>().join(","),
                measure_codes: measure_codes.clone(),
                extra_params: extra_params.clone(),
                uid: self.uid.clone(),
            };
            let stats = retriever.fetch_all_rows(profile.year, dataset, &query).await?;
            tracing::debug!(
                table_id = %dataset.table_id,
                chunk = index + 1,
                of = chunks.len(),
                inserted = stats.rows_inserted,
                "chunk complete"
            );
            rows += stats;
        }

        Ok(IngestOutcome::Loaded(DatasetStats {
            table_id: dataset.table_id.clone(),
            cell_dimension: shape.cell_dimension,
            cells: cells.len() as u64,
            chunks: chunks.len() as u64,
            rows,
        }))
    }

    /// Load every dataset each profile selects, profile by profile, in catalog order.
    ///
    /// Stops at the first fatal error; skipped datasets are counted, not fatal.
    pub async fn run(&self, catalog: &Catalog, profiles: &[&YearProfile]) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::default();
        for profile in profiles {
            let selected = catalog.select(profile);
            tracing::info!(year = profile.year, datasets = selected.len(), "starting profile");
            for dataset in selected {
                let outcome = self.ingest(profile, dataset).await?;
                summary.record(&outcome);
            }
        }
        tracing::info!(
            loaded = summary.loaded,
            skipped = summary.skipped,
            pages = summary.rows.pages,
            rows_inserted = summary.rows.rows_inserted,
            "run complete"
        );
        Ok(summary)
    }
}
