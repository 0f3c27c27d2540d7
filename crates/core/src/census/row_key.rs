//! Content-addressed keys for observation rows.
//!
//! SQLite treats NULLs as distinct inside a UNIQUE constraint, so uniqueness
//! over the full row tuple is enforced through a hash of every column instead.

use sha2::{Digest, Sha256};

/// Compute the key for a row from its column values, in column order.
///
/// A NULL column and an empty-string column hash differently.
pub fn compute_row_key<'a>(columns: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let mut hasher = Sha256::new();
    for column in columns {
        match column {
            Some(value) => {
                hasher.update(b"s");
                hasher.update((value.len() as u64).to_le_bytes());
                hasher.update(value.as_bytes());
            }
            None => hasher.update(b"n"),
        }
    }
    hex::encode(hasher.finalize())
}
