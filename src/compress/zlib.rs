//! The general-purpose stream compressor used for image data.
//!
//! The codec only depends on the [`StreamCompressor`] trait; [`Zlib`] is the
//! default implementation and delegates to `flate2`.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Upper bound on the up-front allocation taken from a size hint.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// A lossless byte-stream compressor/decompressor pair.
pub trait StreamCompressor {
    /// Compress `data` into a self-contained stream.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a stream produced by [`StreamCompressor::compress`].
    ///
    /// With `max_len` set, inflation stops once `max_len + 1` bytes have been
    /// produced, so a result longer than `max_len` means the stream carries
    /// more data than the caller asked for.
    fn decompress(&self, data: &[u8], max_len: Option<usize>) -> Result<Vec<u8>>;
}

/// zlib (RFC 1950) wrapped DEFLATE, as required by PNG compression method 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zlib {
    level: u32,
}

impl Zlib {
    /// Create a compressor with the given level (1-9).
    pub fn new(level: u8) -> Self {
        Self {
            level: level.clamp(1, 9) as u32,
        }
    }

    /// Compression level in use.
    pub fn level(&self) -> u8 {
        self.level as u8
    }
}

impl Default for Zlib {
    fn default() -> Self {
        Self::new(6)
    }
}

impl StreamCompressor for Zlib {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(data.len() / 2 + 64),
            Compression::new(self.level),
        );
        encoder
            .write_all(data)
            .map_err(|e| Error::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| Error::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8], max_len: Option<usize>) -> Result<Vec<u8>> {
        let capacity = max_len.unwrap_or(data.len().saturating_mul(4));
        let mut out = Vec::with_capacity(capacity.min(MAX_PREALLOC));
        let mut decoder = ZlibDecoder::new(data);
        let read = match max_len {
            Some(max) => decoder
                .take((max as u64).saturating_add(1))
                .read_to_end(&mut out),
            None => decoder.read_to_end(&mut out),
        };
        read.map_err(|e| Error::Decompression(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let data: Vec<u8> = (0..4096).map(|i| (i % 17) as u8).collect();
        let codec = Zlib::default();
        let packed = codec.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(codec.decompress(&packed, Some(data.len())).unwrap(), data);
    }

    #[test]
    fn test_zlib_header() {
        let packed = Zlib::new(9).compress(b"abc").unwrap();
        // CMF byte: deflate with 32K window
        assert_eq!(packed[0], 0x78);
        assert_eq!(((packed[0] as u16) << 8 | packed[1] as u16) % 31, 0);
    }

    #[test]
    fn test_malformed_stream_is_decompression_error() {
        let err = Zlib::default()
            .decompress(&[0x00, 0x01, 0x02, 0x03], None)
            .unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }

    #[test]
    fn test_max_len_bounds_output() {
        let codec = Zlib::default();
        let packed = codec.compress(&vec![0u8; 1 << 20]).unwrap();
        let out = codec.decompress(&packed, Some(100)).unwrap();
        assert_eq!(out.len(), 101);
        assert!(out.capacity() < 1 << 20);

        let exact = codec.compress(&[7u8; 100]).unwrap();
        assert_eq!(codec.decompress(&exact, Some(100)).unwrap(), vec![7u8; 100]);
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(Zlib::new(0).level(), 1);
        assert_eq!(Zlib::new(42).level(), 9);
    }
}
