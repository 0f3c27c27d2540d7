//! Paginated retrieval of data rows.
//!
//! The data endpoint returns at most `RecordLimit` rows per request. Pages
//! are requested in increasing offset order and each page is written to the
//! store (and committed) before the next one is requested, so an interrupted
//! run loses at most the page in flight.
//!
//! The API does not report a reliable total row count. A page with fewer
//! rows than the limit is taken as the last one. This is an approximation:
//! a dataset whose row count is an exact multiple of the limit costs one
//! extra empty request, and rows the API only serves after a full final page
//! would be missed.

use census_core::{CensusDb, CensusRow, DatasetDescriptor, Error};

use super::{DataQuery, NomisApi};
use crate::fetch::PageSource;

/// Counters for one paginated retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrievalStats {
    pub pages: u64,
    pub rows_received: u64,
    pub rows_inserted: u64,
}

impl std::ops::AddAssign for RetrievalStats {
    fn add_assign(&mut self, other: Self) {
        self.pages += other.pages;
        self.rows_received += other.rows_received;
        self.rows_inserted += other.rows_inserted;
    }
}

/// Empty CSV fields are stored as NULL; everything else is kept verbatim.
fn normalize(field: &str) -> Option<String> {
    if field.is_empty() { None } else { Some(field.to_string()) }
}

/// Parse one CSV page into rows for `dataset`, dropping the header.
pub fn parse_page(body: &str, year: i32, dataset: &DatasetDescriptor) -> Result<Vec<CensusRow>, Error> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(body.as_bytes());

    reader
        .records()
        .map(|record| {
            let record = record.map_err(|e| Error::InvalidResponse(format!("data page: {e}")))?;
            let fields = record.iter().map(normalize).collect();
            CensusRow::from_fields(year, &dataset.table_id, &dataset.table_name, fields)
        })
        .collect()
}

/// Walks the pages of one data query and stores every row.
pub struct PagedRetriever<'a, S> {
    api: &'a NomisApi<S>,
    store: &'a CensusDb,
    record_limit: u64,
}

impl<'a, S: PageSource> PagedRetriever<'a, S> {
    /// `record_limit` is the page size requested from the API.
    pub fn new(api: &'a NomisApi<S>, store: &'a CensusDb, record_limit: u64) -> Result<Self, Error> {
        if record_limit == 0 {
            return Err(Error::InvalidInput("record limit must be greater than 0".into()));
        }
        Ok(Self { api, store, record_limit })
    }

    /// Fetch every page of `query` and insert the rows, page by page.
    pub async fn fetch_all_rows(
        &self, year: i32, dataset: &DatasetDescriptor, query: &DataQuery,
    ) -> Result<RetrievalStats, Error> {
        let mut stats = RetrievalStats::default();
        let mut offset = 0u64;

        loop {
            let body = self.api.data_page(query, self.record_limit, offset).await?;
            let rows = parse_page(&body, year, dataset)?;
            let received = rows.len() as u64;

            let inserted = self.store.insert_rows(rows).await?;

            stats.pages += 1;
            stats.rows_received += received;
            stats.rows_inserted += inserted;

            tracing::debug!(
                table_id = %dataset.table_id,
                offset,
                received,
                inserted,
                "stored data page"
            );

            if received < self.record_limit {
                break;
            }
            offset += self.record_limit;
        }

        Ok(stats)
    }
}
