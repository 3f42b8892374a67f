//! PNG chunk framing.
//!
//! A chunk is `length(4) | type(4) | body(length) | crc(4)`, all integers
//! big-endian, with the CRC computed over type and body. [`ChunkReader`] walks
//! the framing and verifies every CRC; [`Chunk::parse`] turns a verified frame
//! into one of the chunk kinds the codec understands.

use log::debug;

use super::header::Header;
use crate::compress::crc32::chunk_crc;
use crate::error::{Error, Result};

/// PNG file signature (magic bytes).
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes of framing around each chunk body: length, type and CRC.
const FRAME_OVERHEAD: usize = 12;

/// Longest keyword a tEXt chunk may carry.
pub const MAX_KEYWORD_LEN: usize = 79;

/// Write a PNG chunk (length, type, data, CRC32) to the output buffer.
pub fn write_chunk(output: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    output.reserve(FRAME_OVERHEAD + data.len());
    output.extend_from_slice(&(data.len() as u32).to_be_bytes());
    output.extend_from_slice(chunk_type);
    output.extend_from_slice(data);
    output.extend_from_slice(&chunk_crc(chunk_type, data).to_be_bytes());
}

/// One chunk frame as it appears in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// Four ASCII type bytes.
    pub chunk_type: [u8; 4],
    /// Chunk body.
    pub data: &'a [u8],
    /// CRC stored after the body.
    pub crc: u32,
}

impl RawChunk<'_> {
    /// Check the stored CRC against type and body.
    pub fn verify(&self) -> Result<()> {
        let actual = chunk_crc(&self.chunk_type, self.data);
        if actual != self.crc {
            return Err(Error::CrcMismatch {
                chunk_type: self.chunk_type,
                expected: self.crc,
                actual,
            });
        }
        Ok(())
    }
}

/// Iterates over the CRC-checked chunks of a PNG byte stream.
///
/// Yields `Err` at most once and then stops.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    /// Check the signature and position the reader on the first chunk.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
            return Err(Error::MalformedHeader);
        }
        Ok(Self {
            data,
            pos: PNG_SIGNATURE.len(),
        })
    }

    fn read_frame(&mut self) -> Result<RawChunk<'a>> {
        let rest = &self.data[self.pos..];
        if rest.len() < FRAME_OVERHEAD {
            return Err(Error::Truncated {
                needed: FRAME_OVERHEAD,
                available: rest.len(),
            });
        }

        let length = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let chunk_type = [rest[4], rest[5], rest[6], rest[7]];
        let needed = length
            .checked_add(FRAME_OVERHEAD)
            .ok_or(Error::Truncated {
                needed: usize::MAX,
                available: rest.len(),
            })?;
        if rest.len() < needed {
            return Err(Error::Truncated {
                needed,
                available: rest.len(),
            });
        }

        let data = &rest[8..8 + length];
        let crc_bytes = &rest[8 + length..needed];
        let crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        self.pos += needed;

        let raw = RawChunk {
            chunk_type,
            data,
            crc,
        };
        raw.verify()?;
        Ok(raw)
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<RawChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let frame = self.read_frame();
        if frame.is_err() {
            self.pos = self.data.len();
        }
        Some(frame)
    }
}

/// The chunk kinds the codec interprets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// IHDR: image header.
    Header(Header),
    /// PLTE: RGB palette entries.
    Palette(Vec<[u8; 3]>),
    /// IDAT: one piece of the compressed image stream.
    ImageData(&'a [u8]),
    /// tEXt: Latin-1 keyword/value pair.
    Text {
        /// Keyword before the NUL separator.
        keyword: String,
        /// Text after the separator.
        text: String,
    },
    /// IEND: end of stream.
    End,
    /// Any other chunk; its body is dropped.
    Ignored([u8; 4]),
}

impl<'a> Chunk<'a> {
    /// Interpret a verified chunk frame.
    pub fn parse(raw: &RawChunk<'a>) -> Result<Self> {
        debug!(
            "chunk {} ({} bytes)",
            String::from_utf8_lossy(&raw.chunk_type),
            raw.data.len()
        );
        Ok(match &raw.chunk_type {
            b"IHDR" => Chunk::Header(Header::parse(raw.data)?),
            b"PLTE" => Chunk::Palette(parse_palette(raw.data)?),
            b"IDAT" => Chunk::ImageData(raw.data),
            b"tEXt" => {
                let (keyword, text) = parse_text(raw.data);
                Chunk::Text { keyword, text }
            }
            b"IEND" => Chunk::End,
            other => Chunk::Ignored(*other),
        })
    }
}

fn parse_palette(data: &[u8]) -> Result<Vec<[u8; 3]>> {
    if data.len() % 3 != 0 || data.len() / 3 > 256 {
        return Err(Error::InvalidFieldValue {
            field: "PLTE length",
            value: data.len() as u32,
        });
    }
    Ok(data
        .chunks_exact(3)
        .map(|rgb| [rgb[0], rgb[1], rgb[2]])
        .collect())
}

/// Split a tEXt body at its first NUL. A body without a separator is all
/// keyword.
fn parse_text(data: &[u8]) -> (String, String) {
    match data.iter().position(|&b| b == 0) {
        Some(nul) => (latin1_to_string(&data[..nul]), latin1_to_string(&data[nul + 1..])),
        None => (latin1_to_string(data), String::new()),
    }
}

/// Decode ISO 8859-1 bytes; every byte maps to the code point of equal value.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a string as ISO 8859-1.
pub fn string_to_latin1(field: &'static str, s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(c as u32).map_err(|_| Error::InvalidFieldValue {
                field,
                value: c as u32,
            })
        })
        .collect()
}

/// Check a tEXt keyword: 1-79 Latin-1 characters with no NUL.
pub fn validate_keyword(keyword: &str) -> Result<Vec<u8>> {
    let bytes = string_to_latin1("tEXt keyword", keyword)?;
    if bytes.is_empty() || bytes.len() > MAX_KEYWORD_LEN {
        return Err(Error::InvalidFieldValue {
            field: "tEXt keyword length",
            value: bytes.len() as u32,
        });
    }
    if bytes.contains(&0) {
        return Err(Error::InvalidFieldValue {
            field: "tEXt keyword",
            value: 0,
        });
    }
    Ok(bytes)
}

/// Build a tEXt body: keyword, NUL, text.
pub fn text_body(keyword: &str, text: &str) -> Result<Vec<u8>> {
    let mut body = validate_keyword(keyword)?;
    body.push(0);
    body.extend_from_slice(&string_to_latin1("tEXt text", text)?);
    Ok(body)
}
