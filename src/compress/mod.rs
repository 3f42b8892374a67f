//! Checksums and the zlib stream seam.

pub mod crc32;
pub mod zlib;

pub use crc32::crc32;
pub use zlib::{StreamCompressor, Zlib};
