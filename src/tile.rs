//! Tile buffers and transparent gzip handling.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::{Result, TileQueryError};

/// A tile buffer lent to the engine, addressed by its z/x/y position.
///
/// The bytes stay borrowed for the whole query; any inflated copy the engine
/// makes is owned internally and dropped once the result document has been
/// built.
///
/// Tiles in one query may sit at different zoom levels; the projection is
/// computed per tile and per layer.
#[derive(Debug, Clone, Copy)]
pub struct TileRef<'a> {
    pub z: u32,
    pub x: u32,
    pub y: u32,
    pub buffer: &'a [u8],
}

impl<'a> TileRef<'a> {
    pub fn new(z: u32, x: u32, y: u32, buffer: &'a [u8]) -> Self {
        Self { z, x, y, buffer }
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Inflate `bytes` when they carry a gzip header, otherwise pass them
/// through untouched.
pub(crate) fn maybe_inflate(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(bytes));
    }

    let mut inflated = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut inflated)
        .map_err(|e| TileQueryError::Decode(format!("gzip inflation failed: {}", e)))?;
    Ok(Cow::Owned(inflated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_bytes_pass_through_borrowed() {
        let bytes = b"plain tile bytes";
        let view = maybe_inflate(bytes).unwrap();
        assert!(matches!(view, Cow::Borrowed(_)));
        assert_eq!(view.as_ref(), bytes);
    }

    #[test]
    fn test_gzip_bytes_are_inflated() {
        let original = b"tile payload that gets compressed";
        let compressed = gzip(original);
        assert_ne!(&compressed[..], &original[..]);

        let view = maybe_inflate(&compressed).unwrap();
        assert!(matches!(view, Cow::Owned(_)));
        assert_eq!(view.as_ref(), original);
    }

    #[test]
    fn test_truncated_gzip_is_a_decode_error() {
        let mut compressed = gzip(b"payload");
        compressed.truncate(6);

        let err = maybe_inflate(&compressed).unwrap_err();
        assert!(matches!(err, TileQueryError::Decode(_)));
    }

    #[test]
    fn test_empty_buffer_passes_through() {
        let view = maybe_inflate(&[]).unwrap();
        assert!(view.is_empty());
    }
}
