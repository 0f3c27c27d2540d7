//! Database schema migrations.
//!
//! Uses a simple version table approach to track applied migrations.
//! Each store (response cache, census data) has its own ordered migration list.

use std::num::ParseIntError;

use crate::Error;
use tokio_rusqlite::{Connection, params};

/// A single migration: (version, SQL).
pub(crate) type Migration = (&'static str, &'static str);

/// Migrations for the response cache store.
///
/// All migrations are idempotent using CREATE IF NOT EXISTS.
pub(crate) const CACHE: &[Migration] = &[("1", include_str!("../migrations/cache/001_pages.sql"))];

/// Migrations for the census store.
pub(crate) const CENSUS: &[Migration] = &[("1", include_str!("../migrations/census/001_census.sql"))];

/// Run any pending migrations from `migrations`.
///
/// This creates the _migrations table if it doesn't exist, checks the
/// current version, and applies any migrations that haven't been run yet.
///
/// # Errors
///
/// Returns an error if a migration SQL fails to execute.
pub(crate) async fn run(conn: &Connection, migrations: &'static [Migration]) -> Result<(), Error> {
    conn.call(move |conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(Error::from)?;

        let current: i64 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| {
                row.get(0)
            })
            .map_err(Error::from)?;

        for (version, sql) in migrations {
            let version_num: i64 = version
                .parse()
                .map_err(|e: ParseIntError| Error::MigrationFailed(e.to_string()))?;
            if version_num > current {
                let tx = conn.transaction()?;
                tx.execute_batch(sql)
                    .map_err(|e| Error::MigrationFailed(format!("version {version_num}: {e}")))?;
                tx.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version_num, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.commit()?;
                tracing::debug!(version = version_num, "applied migration");
            }
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
