//! Client code for census-load.
//!
//! This crate provides the HTTP fetch pipeline with its response cache, the
//! census API client (catalog, code lists, paginated data), and the
//! ingestion pipeline that writes into the census store.

pub mod fetch;
pub mod ingest;
pub mod nomis;

pub use fetch::{CachedSource, FetchClient, FetchConfig, FetchResponse, PageSource};
pub use ingest::{DatasetStats, IngestOutcome, Pipeline, RunSummary, chunk_codes};
pub use nomis::{Catalog, Code, CodeList, DataQuery, NomisApi, PagedRetriever, RetrievalStats};
