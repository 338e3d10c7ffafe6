//! Gzip compression of large POST bodies.

use std::borrow::Cow;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Bodies strictly larger than this many bytes are gzip-compressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 10 * 1024;

/// Gzip `data` (deflate with the standard gzip header and trailer).
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Compress `data` if it exceeds `threshold`. The flag tells whether the
/// returned bytes are gzip-encoded.
pub fn compress_if_large(data: &[u8], threshold: usize) -> std::io::Result<(Cow<'_, [u8]>, bool)> {
    if data.len() <= threshold {
        return Ok((Cow::Borrowed(data), false));
    }
    Ok((Cow::Owned(gzip(data)?), true))
}
