//! Conversion between defiltered scanlines and the pixel grid.

use super::header::Header;
use crate::bits::{pack_samples, BitReader};
use crate::color::ColorType;
use crate::error::{Error, Result};
use crate::image::Pixel;

/// Split decompressed image data into per-row filter type bytes and rows.
///
/// Bytes past the last scanline are ignored; the caller decides whether that
/// is worth reporting.
pub fn split_scanlines(data: &[u8], header: &Header) -> Result<(Vec<u8>, Vec<Vec<u8>>)> {
    let expected = header.filtered_len()?;
    if data.len() < expected {
        return Err(Error::InsufficientData {
            needed: expected,
            available: data.len(),
        });
    }

    let row_bytes = header.row_bytes();
    let height = header.height as usize;
    let mut filter_types = Vec::with_capacity(height);
    let mut rows = Vec::with_capacity(height);
    for scanline in data[..expected].chunks_exact(row_bytes + 1) {
        filter_types.push(scanline[0]);
        rows.push(scanline[1..].to_vec());
    }
    Ok((filter_types, rows))
}

/// Unpack every defiltered row into pixels, top to bottom.
///
/// Indexed rows are resolved through `palette` into RGB pixels.
pub fn unpack_rows(
    rows: &[Vec<u8>],
    header: &Header,
    palette: &[[u8; 3]],
) -> Result<Vec<Vec<Pixel>>> {
    rows.iter()
        .map(|row| {
            unpack_row(
                row,
                header.width as usize,
                header.color_type,
                header.bit_depth,
                palette,
            )
        })
        .collect()
}

/// Draw `width` pixels of `bit_depth`-wide samples from one row, MSB first.
pub fn unpack_row(
    row: &[u8],
    width: usize,
    color_type: ColorType,
    bit_depth: u8,
    palette: &[[u8; 3]],
) -> Result<Vec<Pixel>> {
    let mut reader = BitReader::new(row);
    let mut pixels = Vec::with_capacity(width);

    for _ in 0..width {
        if color_type == ColorType::Indexed {
            let index = reader.read_bits(bit_depth)? as u16;
            let [r, g, b] =
                *palette
                    .get(index as usize)
                    .ok_or(Error::InvalidPaletteIndex {
                        index,
                        palette_len: palette.len(),
                    })?;
            pixels.push(vec![r as u16, g as u16, b as u16]);
        } else {
            let mut pixel = Vec::with_capacity(color_type.samples_per_pixel());
            for _ in 0..color_type.samples_per_pixel() {
                pixel.push(reader.read_bits(bit_depth)? as u16);
            }
            pixels.push(pixel);
        }
    }

    Ok(pixels)
}

/// Pack one pixel row into a zero-padded scanline.
///
/// Samples are written in stored order (gray[, alpha] or R, G, B[, alpha]).
pub fn pack_row(row: &[Pixel], bit_depth: u8) -> Vec<u8> {
    let samples: Vec<u16> = row.iter().flatten().copied().collect();
    pack_samples(&samples, bit_depth)
}

/// Pack every pixel row into scanlines, ready for filtering.
pub fn pack_rows(pixels: &[Vec<Pixel>], bit_depth: u8) -> Vec<Vec<u8>> {
    pixels.iter().map(|row| pack_row(row, bit_depth)).collect()
}
