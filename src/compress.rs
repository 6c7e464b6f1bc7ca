//! zlib helpers for pak resource payloads.
//!
//! The shipped engines read zlib for the older titles and a segmented format
//! for the newer ones; this pipeline emits zlib inside the newer block
//! framing as well, which the titles accept (see DESIGN.md).

use std::io::Write;

use flate2::Compression;
use flate2::write::{ZlibDecoder, ZlibEncoder};

pub fn compress(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn decompress(data: &[u8], uncompressed_size: usize) -> anyhow::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(Vec::with_capacity(uncompressed_size));
    decoder.write_all(data)?;
    let out = decoder.finish()?;
    if out.len() != uncompressed_size {
        anyhow::bail!(
            "expected {} bytes after decompression, got {}",
            uncompressed_size,
            out.len()
        );
    }
    Ok(out)
}

/// Rounds `size` up to the next multiple of `align` (a power of two).
pub fn padded_size(size: u32, align: u32) -> u32 {
    debug_assert!(align.is_power_of_two());
    (size + align - 1) & !(align - 1)
}
