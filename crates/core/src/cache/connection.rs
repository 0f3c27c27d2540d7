//! Cache database handle.

use crate::{Error, db, migrations};
use std::path::Path;
use tokio_rusqlite::Connection;

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open the cache at the specified path.
    ///
    /// Creates the parent directory and file if they don't exist, applies
    /// pragmas, and creates the `pages` table.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = db::open(path.as_ref(), migrations::CACHE).await?;
        Ok(Self { conn })
    }

    /// Open an in-memory cache for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = db::open_in_memory(migrations::CACHE).await?;
        Ok(Self { conn })
    }
}
