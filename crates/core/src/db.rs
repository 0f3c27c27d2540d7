//! Connection setup shared by both SQLite stores.
//!
//! Opens the database, applies the pragmas required for performance and
//! crash safety (WAL mode), and runs the store's migrations.

use crate::Error;
use crate::migrations::{self, Migration};
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Open a database file, creating it and its parent directory if needed.
pub(crate) async fn open(path: &Path, migrations: &'static [Migration]) -> Result<Connection, Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
    prepare(conn, migrations).await
}

/// Open an in-memory database with the same configuration as file-based ones.
pub(crate) async fn open_in_memory(migrations: &'static [Migration]) -> Result<Connection, Error> {
    let conn = Connection::open_in_memory()
        .await
        .map_err(|e| Error::Database(e.into()))?;
    prepare(conn, migrations).await
}

async fn prepare(conn: Connection, migrations: &'static [Migration]) -> Result<Connection, Error> {
    conn.call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
    })
    .await
    .map_err(Error::Database)?;

    migrations::run(&conn, migrations).await?;

    Ok(conn)
}
