//! Gzip adapter for message bodies.

use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{FrameError, Result};

/// Gzip-compress a body at the default level.
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(input.len() / 2 + 32),
        Compression::default(),
    );
    encoder.write_all(input).map_err(FrameError::Compression)?;
    encoder.finish().map_err(FrameError::Compression)
}

/// Decompress a complete gzip stream, including every concatenated member.
///
/// Truncated or corrupt input, and trailing bytes that do not form another
/// member, are a [`FrameError::Decompression`].
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(input);
    let mut out = Vec::with_capacity(input.len().saturating_mul(2));
    decoder
        .read_to_end(&mut out)
        .map_err(FrameError::Decompression)?;
    Ok(out)
}
