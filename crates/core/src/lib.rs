//! Core types and shared functionality for census-load.
//!
//! This crate provides:
//! - Response cache with SQLite backend
//! - Census store (tables, cells, observations)
//! - Dataset descriptors and dimension-shape classification
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod census;
pub mod config;
pub mod dataset;
pub mod error;

mod db;
mod migrations;

pub use cache::{CacheDb, PageLookup};
pub use census::{CellMeta, CensusDb, CensusRow, TableMeta};
pub use config::{AppConfig, ConfigError, TableSelection, YearProfile};
pub use dataset::{DatasetDescriptor, DimensionShape, ShapeError, ShapeMatch};
pub use error::Error;
