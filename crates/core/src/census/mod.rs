//! SQLite-backed census store.
//!
//! Holds three tables:
//!
//! - `tables`: which datasets were loaded for which census year
//! - `cells`: the cell codes (and their descriptions) of each dataset
//! - `observations`: the data rows themselves
//!
//! Every insert is insert-or-ignore, so re-running a load never duplicates
//! rows. Each call commits its own transaction.

pub mod meta;
pub mod observations;
pub mod row_key;

use crate::{Error, db, migrations};
use std::path::Path;
use tokio_rusqlite::Connection;

pub use meta::{CellMeta, TableMeta};
pub use observations::CensusRow;

/// Census store handle.
#[derive(Clone, Debug)]
pub struct CensusDb {
    pub(crate) conn: Connection,
}

impl CensusDb {
    /// Open the census store at the specified path, creating the schema if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = db::open(path.as_ref(), migrations::CENSUS).await?;
        Ok(Self { conn })
    }

    /// Open an in-memory census store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = db::open_in_memory(migrations::CENSUS).await?;
        Ok(Self { conn })
    }

    async fn count(&self, sql: &'static str) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored observation rows.
    pub async fn observation_count(&self) -> Result<u64, Error> {
        self.count("SELECT COUNT(*) FROM observations").await
    }

    /// Number of stored table metadata records.
    pub async fn table_count(&self) -> Result<u64, Error> {
        self.count("SELECT COUNT(*) FROM tables").await
    }

    /// Number of stored cell metadata records.
    pub async fn cell_count(&self) -> Result<u64, Error> {
        self.count("SELECT COUNT(*) FROM cells").await
    }
}
