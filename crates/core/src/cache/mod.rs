//! SQLite-backed response cache.
//!
//! Maps the exact request URL (query string included) to the zlib-compressed
//! response body. The cache is append-only: there is no expiry and no
//! eviction. To clear it, delete the database file.

pub mod compress;
pub mod connection;
pub mod pages;

pub use crate::Error;

pub use connection::CacheDb;
pub use pages::PageLookup;
