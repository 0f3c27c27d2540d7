//! Page lookups and inserts.

use super::compress::{compress_body, decompress_body};
use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Result of looking a URL up in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    /// A stored, decodable body.
    Hit(String),
    /// No entry for this URL.
    Miss,
    /// An entry exists but is empty or cannot be decoded. Callers treat it as a miss.
    Corrupt(String),
}

impl CacheDb {
    /// Look up the body stored for `url`.
    ///
    /// Decode failures are reported as [`PageLookup::Corrupt`], never as errors.
    /// Only failures of the database itself produce `Err`.
    pub async fn lookup_page(&self, url: &str) -> Result<PageLookup, Error> {
        let url = url.to_string();
        let stored = self
            .conn
            .call(move |conn| -> Result<Option<rusqlite::types::Value>, Error> {
                let value = conn
                    .query_row("SELECT body FROM pages WHERE url = ?1", params![url], |row| row.get(0))
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(Error::from)?;

        let lookup = match stored {
            None => PageLookup::Miss,
            Some(rusqlite::types::Value::Blob(bytes)) if bytes.is_empty() => {
                PageLookup::Corrupt("empty body".to_string())
            }
            Some(rusqlite::types::Value::Blob(bytes)) => match decompress_body(&bytes) {
                Ok(body) => PageLookup::Hit(body),
                Err(e) => PageLookup::Corrupt(e.to_string()),
            },
            Some(other) => PageLookup::Corrupt(format!("unexpected column type {:?}", other.data_type())),
        };

        Ok(lookup)
    }

    /// Store the compressed body for `url`.
    ///
    /// Replaces an existing entry for the same URL, which only happens when
    /// that entry was found corrupt and re-fetched.
    pub async fn store_page(&self, url: &str, body: &str) -> Result<(), Error> {
        let url = url.to_string();
        let compressed = compress_body(body)?;
        let fetched_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO pages (url, body, fetched_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(url) DO UPDATE SET
                        body = excluded.body,
                        fetched_at = excluded.fetched_at",
                    params![url, compressed, fetched_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of cached pages.
    pub async fn page_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.nomisweb.co.uk/api/v01/dataset/NM_1_1.data.csv?date=latest&RecordOffset=0";

    async fn put_raw(db: &CacheDb, url: &'static str, body: rusqlite::types::Value) {
        db.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO pages (url, body, fetched_at) VALUES (?1, ?2, '2024-01-01T00:00:00Z')",
                    params![url, body],
                )
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_store_and_lookup() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store_page(URL, "a,b\n1,2\n").await.unwrap();

        assert_eq!(db.lookup_page(URL).await.unwrap(), PageLookup::Hit("a,b\n1,2\n".to_string()));
        assert_eq!(db.page_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert_eq!(db.lookup_page(URL).await.unwrap(), PageLookup::Miss);
    }

    #[tokio::test]
    async fn test_lookup_is_exact_on_query_string() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store_page(URL, "body").await.unwrap();

        let other = URL.replace("RecordOffset=0", "RecordOffset=100000");
        assert_eq!(db.lookup_page(&other).await.unwrap(), PageLookup::Miss);
    }

    #[tokio::test]
    async fn test_empty_stored_body_is_corrupt() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store_page(URL, "").await.unwrap();
        assert_eq!(db.lookup_page(URL).await.unwrap(), PageLookup::Hit(String::new()));

        let db = CacheDb::open_in_memory().await.unwrap();
        put_raw(&db, URL, rusqlite::types::Value::Blob(Vec::new())).await;
        assert!(matches!(db.lookup_page(URL).await.unwrap(), PageLookup::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_corrupt() {
        let db = CacheDb::open_in_memory().await.unwrap();
        put_raw(&db, URL, rusqlite::types::Value::Blob(b"not zlib".to_vec())).await;
        assert!(matches!(db.lookup_page(URL).await.unwrap(), PageLookup::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_store_replaces_corrupt_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        put_raw(&db, URL, rusqlite::types::Value::Text("oops".to_string())).await;
        assert!(matches!(db.lookup_page(URL).await.unwrap(), PageLookup::Corrupt(_)));

        db.store_page(URL, "fresh").await.unwrap();
        assert_eq!(db.lookup_page(URL).await.unwrap(), PageLookup::Hit("fresh".to_string()));
        assert_eq!(db.page_count().await.unwrap(), 1);
    }
}
