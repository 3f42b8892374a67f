//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod synthetic;

use pilates::compress::{StreamCompressor, Zlib};
use pilates::png::chunk::write_chunk;
use pilates::png::PNG_SIGNATURE;

/// Build an IHDR body.
pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
    let mut body = Vec::with_capacity(13);
    body.extend_from_slice(&width.to_be_bytes());
    body.extend_from_slice(&height.to_be_bytes());
    body.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
    body
}

/// Frame raw chunks behind the PNG signature.
pub fn assemble(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    for (chunk_type, body) in chunks {
        write_chunk(&mut out, chunk_type, body);
    }
    out
}

/// Compress already-filtered scanlines (filter byte included).
pub fn zlib(filtered: &[u8]) -> Vec<u8> {
    Zlib::default().compress(filtered).expect("compress")
}

/// Byte offset of the first chunk with the given type.
pub fn find_chunk(png: &[u8], chunk_type: &[u8; 4]) -> Option<usize> {
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        if &png[pos + 4..pos + 8] == chunk_type {
            return Some(pos);
        }
        pos += 12 + len;
    }
    None
}
