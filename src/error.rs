//! Error types for the pilates library.

use std::fmt;

/// Result type alias for pilates operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding, encoding or editing an image.
///
/// Every variant is terminal for the operation that produced it: a decode
/// never returns a partially populated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input does not start with the PNG signature.
    MalformedHeader,
    /// A chunk's stored CRC does not match the CRC of its type and body.
    CrcMismatch {
        /// Chunk type tag.
        chunk_type: [u8; 4],
        /// CRC stored in the stream.
        expected: u32,
        /// CRC computed over type and body.
        actual: u32,
    },
    /// A well-formed feature this codec does not implement (e.g. interlacing).
    UnsupportedFeature(String),
    /// A header or chunk field holds a value outside its allowed set.
    InvalidFieldValue {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: u32,
    },
    /// A chunk appeared before the chunks it depends on.
    OutOfOrderChunk {
        /// Chunk type tag.
        chunk_type: [u8; 4],
        /// What ordering rule was broken.
        reason: &'static str,
    },
    /// A required chunk never appeared.
    MissingChunk(&'static str),
    /// Chunk framing runs past the end of the input.
    Truncated {
        /// Bytes the chunk needs.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },
    /// A palette index read from image data is outside the palette.
    InvalidPaletteIndex {
        /// Index read from the scanline.
        index: u16,
        /// Number of palette entries.
        palette_len: usize,
    },
    /// A bit or byte source ran dry.
    InsufficientData {
        /// Units (bits or bytes) requested.
        needed: usize,
        /// Units actually available.
        available: usize,
    },
    /// A pixel or pixel grid does not fit the image format.
    InvalidPixelShape(String),
    /// A scanline carries a filter type outside 0..=4.
    UnknownFilterType(u8),
    /// The number of filter types differs from the number of rows.
    FilterCountMismatch {
        /// Number of rows.
        rows: usize,
        /// Number of filter types supplied.
        filter_types: usize,
    },
    /// The stream decompressor rejected the image data.
    Decompression(String),
    /// The stream compressor failed.
    Compression(String),
    /// Reading or writing a file failed.
    Io(String),
}

/// Render a chunk tag for messages, tolerating non-ASCII bytes.
fn tag(chunk_type: &[u8; 4]) -> String {
    String::from_utf8_lossy(chunk_type).into_owned()
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedHeader => write!(f, "Malformed header: not a PNG stream"),
            Error::CrcMismatch {
                chunk_type,
                expected,
                actual,
            } => write!(
                f,
                "CRC mismatch in {} chunk: stored {:#010x}, computed {:#010x}",
                tag(chunk_type),
                expected,
                actual
            ),
            Error::UnsupportedFeature(what) => write!(f, "Unsupported feature: {}", what),
            Error::InvalidFieldValue { field, value } => {
                write!(f, "Invalid value {} for field {}", value, field)
            }
            Error::OutOfOrderChunk { chunk_type, reason } => {
                write!(f, "Out of order {} chunk: {}", tag(chunk_type), reason)
            }
            Error::MissingChunk(name) => write!(f, "Missing {} chunk", name),
            Error::Truncated { needed, available } => write!(
                f,
                "Truncated chunk: needs {} bytes, {} available",
                needed, available
            ),
            Error::InvalidPaletteIndex { index, palette_len } => write!(
                f,
                "Invalid palette index {} for palette of {} entries",
                index, palette_len
            ),
            Error::InsufficientData { needed, available } => write!(
                f,
                "Insufficient data: needed {}, only {} available",
                needed, available
            ),
            Error::InvalidPixelShape(msg) => write!(f, "Invalid pixel shape: {}", msg),
            Error::UnknownFilterType(t) => write!(f, "Unknown filter type {}", t),
            Error::FilterCountMismatch { rows, filter_types } => write!(
                f,
                "Filter type count {} does not match row count {}",
                filter_types, rows
            ),
            Error::Decompression(msg) => write!(f, "Decompression error: {}", msg),
            Error::Compression(msg) => write!(f, "Compression error: {}", msg),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_crc_mismatch() {
        let err = Error::CrcMismatch {
            chunk_type: *b"IDAT",
            expected: 0xDEADBEEF,
            actual: 0x12345678,
        };
        let msg = err.to_string();
        assert!(msg.contains("IDAT"));
        assert!(msg.contains("0xdeadbeef"));
    }

    #[test]
    fn test_display_non_ascii_tag() {
        let err = Error::OutOfOrderChunk {
            chunk_type: [0xFF, b'A', b'B', b'C'],
            reason: "before IHDR",
        };
        assert!(err.to_string().contains("before IHDR"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(ref m) if m.contains("nope")));
    }
}
