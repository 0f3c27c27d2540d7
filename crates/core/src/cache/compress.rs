//! zlib compression of cached response bodies.

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Compress a UTF-8 body for storage.
pub fn compress_body(body: &str) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(body.len() / 4), Compression::default());
    encoder.write_all(body.as_bytes())?;
    encoder.finish()
}

/// Decompress a stored body. Fails on truncated or non-zlib input and on
/// bodies that are not valid UTF-8.
pub fn decompress_body(bytes: &[u8]) -> std::io::Result<String> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut body = String::new();
    decoder.read_to_string(&mut body)?;
    Ok(body)
}
