//! Caching page source.
//!
//! Wraps another [`PageSource`] with the persistent response cache: a URL
//! already in the cache is served from it without touching the network;
//! otherwise the inner source is asked and a successful body is stored,
//! keyed by the exact URL string, before it is returned.
//!
//! The cache store is created on first use. Entries never expire.

use std::path::PathBuf;

use census_core::{CacheDb, Error, PageLookup};
use tokio::sync::OnceCell;

use super::PageSource;

/// A [`PageSource`] backed by the SQLite response cache.
pub struct CachedSource<S> {
    inner: S,
    /// Database file; `None` keeps the cache in memory.
    path: Option<PathBuf>,
    db: OnceCell<CacheDb>,
}

impl<S: PageSource> CachedSource<S> {
    /// Cache pages of `inner` in the database at `path`, opened lazily.
    pub fn new(inner: S, path: impl Into<PathBuf>) -> Self {
        Self { inner, path: Some(path.into()), db: OnceCell::new() }
    }

    /// Cache pages of `inner` in a private in-memory database, opened lazily.
    pub fn in_memory(inner: S) -> Self {
        Self { inner, path: None, db: OnceCell::new() }
    }

    /// Cache pages of `inner` in an already opened database.
    pub fn with_db(inner: S, db: CacheDb) -> Self {
        Self { inner, path: None, db: OnceCell::new_with(Some(db)) }
    }

    /// The uncached source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The cache database, opening it on first call.
    pub async fn db(&self) -> Result<&CacheDb, Error> {
        self.db
            .get_or_try_init(|| async {
                match &self.path {
                    Some(path) => {
                        tracing::debug!(path = %path.display(), "opening response cache");
                        CacheDb::open(path).await
                    }
                    None => CacheDb::open_in_memory().await,
                }
            })
            .await
    }
}

#[async_trait::async_trait]
impl<S: PageSource> PageSource for CachedSource<S> {
    async fn get_page(&self, url: &str) -> Result<String, Error> {
        let db = self.db().await?;

        match db.lookup_page(url).await? {
            PageLookup::Hit(body) => {
                tracing::debug!("cache hit for {}", url);
                return Ok(body);
            }
            PageLookup::Corrupt(reason) => {
                tracing::warn!(%url, %reason, "discarding unreadable cache entry");
            }
            PageLookup::Miss => {}
        }

        let body = self.inner.get_page(url).await?;
        db.store_page(url, &body).await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockSource;

    const URL: &str = "https://api.test/dataset/NM_1_1/MEASURES.def.sdmx.json";

    async fn cached(mock: MockSource) -> CachedSource<MockSource> {
        CachedSource::with_db(mock, CacheDb::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let source = cached(MockSource::new().route("MEASURES", "{\"measures\":[20100]}")).await;

        let first = source.get_page(URL).await.unwrap();
        let second = source.get_page(URL).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_bytes(), "{\"measures\":[20100]}".as_bytes());
        assert_eq!(source.inner().request_count(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_cache_opens_lazily() {
        let source = CachedSource::in_memory(MockSource::new().route("MEASURES", "body"));

        assert_eq!(source.get_page(URL).await.unwrap(), "body");
        assert_eq!(source.get_page(URL).await.unwrap(), "body");
        assert_eq!(source.inner().request_count(), 1);
        assert_eq!(source.db().await.unwrap().page_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_distinct_query_strings_are_distinct_entries() {
        let source = cached(MockSource::new().route("data.csv", "h\n")).await;

        source.get_page("https://api.test/NM_1_1.data.csv?RecordOffset=0").await.unwrap();
        source.get_page("https://api.test/NM_1_1.data.csv?RecordOffset=100000").await.unwrap();
        source.get_page("https://api.test/NM_1_1.data.csv?RecordOffset=0").await.unwrap();

        assert_eq!(source.inner().request_count(), 2);
        assert_eq!(source.db().await.unwrap().page_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let source = cached(MockSource::new().fail("MEASURES", 500)).await;

        let err = source.get_page(URL).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed { status: 500, .. }));
        assert_eq!(source.db().await.unwrap().page_count().await.unwrap(), 0);

        assert!(source.get_page(URL).await.is_err());
        assert_eq!(source.inner().request_count(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_entry_triggers_refetch() {
        let dir = temp_dir("corrupt");
        let path = dir.join("cache.db");

        let db = CacheDb::open(&path).await.unwrap();
        db.store_page(URL, "stale").await.unwrap();
        drop(db);

        let raw = tokio_rusqlite::Connection::open(&path).await.unwrap();
        raw.call(|conn| conn.execute("UPDATE pages SET body = x'00ff00ff'", []))
            .await
            .unwrap();
        drop(raw);

        let source = CachedSource::new(MockSource::new().route("MEASURES", "fresh"), &path);
        assert_eq!(source.get_page(URL).await.unwrap(), "fresh");
        assert_eq!(source.get_page(URL).await.unwrap(), "fresh");
        assert_eq!(source.inner().request_count(), 1);

        drop(source);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_lazy_file_cache() {
        let dir = temp_dir("lazy");
        let path = dir.join("cache.db");

        let source = CachedSource::new(MockSource::new().route("MEASURES", "body"), &path);
        assert!(!path.exists());

        source.get_page(URL).await.unwrap();
        assert!(path.exists());

        drop(source);
        let reopened = CachedSource::new(MockSource::new(), &path);
        assert_eq!(reopened.get_page(URL).await.unwrap(), "body");
        assert_eq!(reopened.inner().request_count(), 0);

        drop(reopened);
        let _ = std::fs::remove_dir_all(&dir);
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("census-cached-source-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
