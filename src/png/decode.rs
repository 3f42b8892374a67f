//! PNG decoder: chunk stream to pixel grid.
//!
//! Decoding is a single pass over the chunks. IDAT bodies are collected until
//! IEND, then the whole image stream is decompressed, defiltered and unpacked
//! at once. Any violated rule aborts the decode.

use std::collections::HashMap;

use log::{debug, info, warn};

use super::chunk::{text_body, Chunk, ChunkReader};
use super::filter::unfilter;
use super::header::Header;
use super::scanline::{split_scanlines, unpack_rows};
use crate::color::ColorType;
use crate::compress::zlib::{StreamCompressor, Zlib};
use crate::error::{Error, Result};
use crate::image::Pixel;

/// Everything a decode recovers from a PNG stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPng {
    /// Header of the decoded pixels. Indexed images come back as 8-bit RGB.
    pub header: Header,
    /// Row-major pixel grid.
    pub pixels: Vec<Vec<Pixel>>,
    /// PLTE entries, empty unless the stream was indexed.
    pub palette: Vec<[u8; 3]>,
    /// tEXt keyword/value pairs.
    pub text: HashMap<String, String>,
}

/// Decode a PNG image from bytes using zlib for the image stream.
pub fn decode_png(data: &[u8]) -> Result<DecodedPng> {
    decode_png_with(data, &Zlib::default())
}

/// Decode a PNG image from bytes with a caller-supplied decompressor.
pub fn decode_png_with(data: &[u8], codec: &dyn StreamCompressor) -> Result<DecodedPng> {
    let mut state = DecodeState::default();

    for raw in ChunkReader::new(data)? {
        let raw = raw?;
        if state.header.is_none() && &raw.chunk_type != b"IHDR" {
            return Err(Error::OutOfOrderChunk {
                chunk_type: raw.chunk_type,
                reason: "IHDR must be the first chunk",
            });
        }

        match Chunk::parse(&raw)? {
            Chunk::Header(header) => state.on_header(header)?,
            Chunk::Palette(palette) => state.on_palette(palette),
            Chunk::ImageData(body) => state.on_image_data(body)?,
            Chunk::Text { keyword, text } => state.on_text(keyword, text),
            Chunk::End => return state.finish(codec),
            Chunk::Ignored(chunk_type) => {
                debug!(
                    "skipping ancillary chunk {}",
                    String::from_utf8_lossy(&chunk_type)
                );
            }
        }
    }

    Err(Error::MissingChunk("IEND"))
}

#[derive(Default)]
struct DecodeState {
    header: Option<Header>,
    palette: Option<Vec<[u8; 3]>>,
    image_data: Vec<u8>,
    text: HashMap<String, String>,
}

impl DecodeState {
    fn on_header(&mut self, header: Header) -> Result<()> {
        if self.header.is_some() {
            return Err(Error::OutOfOrderChunk {
                chunk_type: *b"IHDR",
                reason: "duplicate IHDR",
            });
        }
        info!(
            "IHDR: {}x{}, bit depth {}, colour type {}, interlace {}",
            header.width,
            header.height,
            header.bit_depth,
            header.color_type as u8,
            header.interlace_method
        );
        self.header = Some(header);
        Ok(())
    }

    fn on_palette(&mut self, palette: Vec<[u8; 3]>) {
        match self.header {
            Some(h) if h.color_type == ColorType::Indexed => {
                debug!("palette with {} entries", palette.len());
                self.palette = Some(palette);
            }
            _ => debug!("PLTE ignored for non-indexed image"),
        }
    }

    fn on_image_data(&mut self, body: &[u8]) -> Result<()> {
        let indexed = matches!(self.header, Some(h) if h.color_type == ColorType::Indexed);
        if indexed && self.palette.is_none() {
            return Err(Error::OutOfOrderChunk {
                chunk_type: *b"IDAT",
                reason: "indexed image data before PLTE",
            });
        }
        self.image_data.extend_from_slice(body);
        Ok(())
    }

    /// Keep a tEXt attribute if it could be written back out.
    fn on_text(&mut self, keyword: String, text: String) {
        match text_body(&keyword, &text) {
            Ok(_) => {
                self.text.insert(keyword, text);
            }
            Err(e) => warn!("skipping tEXt chunk with keyword {:?}: {}", keyword, e),
        }
    }

    fn finish(self, codec: &dyn StreamCompressor) -> Result<DecodedPng> {
        let header = self.header.ok_or(Error::MissingChunk("IHDR"))?;
        if self.image_data.is_empty() {
            return Err(Error::MissingChunk("IDAT"));
        }

        header.check_pixel_count()?;
        let expected = header.filtered_len()?;
        let decompressed = codec.decompress(&self.image_data, Some(expected))?;
        if decompressed.len() > expected {
            warn!("image data continues past the last scanline");
        }

        let (filter_types, mut rows) = split_scanlines(&decompressed, &header)?;
        unfilter(&mut rows, &filter_types, header.pixel_stride())?;
        debug!("Filter types {:?}", filter_types);

        let palette = self.palette.unwrap_or_default();
        let pixels = unpack_rows(&rows, &header, &palette)?;

        let header = if header.color_type == ColorType::Indexed {
            Header {
                color_type: ColorType::Rgb,
                bit_depth: 8,
                ..header
            }
        } else {
            header
        };

        Ok(DecodedPng {
            header,
            pixels,
            palette,
            text: self.text,
        })
    }
}
