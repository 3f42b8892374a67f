//! PNG scanline filtering.
//!
//! Filters turn each row into residuals against its already-known neighbours
//! so the compressor sees smaller, more repetitive values. For the byte at
//! offset `i` with pixel stride `S`:
//!
//! ```text
//! c b      a = row[i - S]       (0 before the first pixel)
//! a x      b = prev_row[i]      (0 on the first row)
//!          c = prev_row[i - S]  (0 on the first row or before the first pixel)
//! ```
//!
//! Reconstruction depends on the previous row being reconstructed already, so
//! rows are always processed top to bottom.

use super::FilterStrategy;
use crate::error::{Error, Result};

/// Per-row filter types as defined by PNG filter method 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterType {
    /// Identity.
    None = 0,
    /// Difference from the left byte.
    Sub = 1,
    /// Difference from the byte above.
    Up = 2,
    /// Difference from the floored mean of left and above.
    Average = 3,
    /// Difference from the Paeth predictor.
    Paeth = 4,
}

impl FilterType {
    /// Every filter type, in tag order.
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];
}

impl TryFrom<u8> for FilterType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            _ => Err(Error::UnknownFilterType(value)),
        }
    }
}

/// Paeth predictor function.
///
/// Selects the value (a, b, or c) closest to p = a + b - c, breaking ties in
/// the order a, b, c.
#[inline]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[inline]
fn above(prev_row: &[u8], i: usize) -> u8 {
    prev_row.get(i).copied().unwrap_or(0)
}

/// Filter one row, appending the residual bytes (without the type byte).
///
/// `prev_row` is the previous unfiltered row; pass an empty slice for the
/// first row.
pub fn filter_row(
    filter: FilterType,
    row: &[u8],
    prev_row: &[u8],
    stride: usize,
    output: &mut Vec<u8>,
) {
    output.reserve(row.len());
    match filter {
        FilterType::None => output.extend_from_slice(row),
        FilterType::Sub => {
            for (i, &byte) in row.iter().enumerate() {
                let left = if i >= stride { row[i - stride] } else { 0 };
                output.push(byte.wrapping_sub(left));
            }
        }
        FilterType::Up => {
            for (i, &byte) in row.iter().enumerate() {
                output.push(byte.wrapping_sub(above(prev_row, i)));
            }
        }
        FilterType::Average => {
            for (i, &byte) in row.iter().enumerate() {
                let left = if i >= stride { row[i - stride] as u16 } else { 0 };
                let avg = ((left + above(prev_row, i) as u16) / 2) as u8;
                output.push(byte.wrapping_sub(avg));
            }
        }
        FilterType::Paeth => {
            for (i, &byte) in row.iter().enumerate() {
                let left = if i >= stride { row[i - stride] } else { 0 };
                let upper_left = if i >= stride {
                    above(prev_row, i - stride)
                } else {
                    0
                };
                let predicted = paeth_predictor(left, above(prev_row, i), upper_left);
                output.push(byte.wrapping_sub(predicted));
            }
        }
    }
}

/// Reverse the filter on one row, appending the reconstructed bytes.
///
/// `prev_row` must already be reconstructed; pass an empty slice for the
/// first row. The left neighbour is read back from `output`, so `row` and
/// `prev_row` are never written.
pub fn unfilter_row(
    filter: FilterType,
    row: &[u8],
    prev_row: &[u8],
    stride: usize,
    output: &mut Vec<u8>,
) {
    let base = output.len();
    output.reserve(row.len());
    match filter {
        FilterType::None => output.extend_from_slice(row),
        FilterType::Sub => {
            for (i, &byte) in row.iter().enumerate() {
                let left = if i >= stride { output[base + i - stride] } else { 0 };
                output.push(byte.wrapping_add(left));
            }
        }
        FilterType::Up => {
            for (i, &byte) in row.iter().enumerate() {
                output.push(byte.wrapping_add(above(prev_row, i)));
            }
        }
        FilterType::Average => {
            for (i, &byte) in row.iter().enumerate() {
                let left = if i >= stride {
                    output[base + i - stride] as u16
                } else {
                    0
                };
                let avg = ((left + above(prev_row, i) as u16) / 2) as u8;
                output.push(byte.wrapping_add(avg));
            }
        }
        FilterType::Paeth => {
            for (i, &byte) in row.iter().enumerate() {
                let (left, upper_left) = if i >= stride {
                    (output[base + i - stride], above(prev_row, i - stride))
                } else {
                    (0, 0)
                };
                let predicted = paeth_predictor(left, above(prev_row, i), upper_left);
                output.push(byte.wrapping_add(predicted));
            }
        }
    }
}

/// Reverse the filters on every row in place, top to bottom.
///
/// `filter_types[y]` is the raw type byte of row `y`.
pub fn unfilter(rows: &mut [Vec<u8>], filter_types: &[u8], stride: usize) -> Result<()> {
    if rows.len() != filter_types.len() {
        return Err(Error::FilterCountMismatch {
            rows: rows.len(),
            filter_types: filter_types.len(),
        });
    }

    let mut scratch = Vec::new();
    for y in 0..rows.len() {
        let filter = FilterType::try_from(filter_types[y])?;
        let (done, pending) = rows.split_at_mut(y);
        let prev: &[u8] = done.last().map(Vec::as_slice).unwrap_or(&[]);
        let current = &mut pending[0];

        scratch.clear();
        unfilter_row(filter, current, prev, stride, &mut scratch);
        std::mem::swap(current, &mut scratch);
    }
    Ok(())
}

/// Filter every row, prefixing each with its filter type byte.
pub fn apply_filters(rows: &[Vec<u8>], stride: usize, strategy: FilterStrategy) -> Vec<u8> {
    let total: usize = rows.iter().map(|r| r.len() + 1).sum();
    let mut output = Vec::with_capacity(total);
    let mut scratch = AdaptiveScratch::default();
    let mut prev_row: &[u8] = &[];

    for row in rows {
        match strategy.fixed() {
            Some(filter) => {
                output.push(filter as u8);
                filter_row(filter, row, prev_row, stride, &mut output);
            }
            None => adaptive_filter(row, prev_row, stride, &mut output, &mut scratch),
        }
        prev_row = row;
    }

    output
}

/// Scratch buffers reused for adaptive filtering to reduce per-row allocations.
#[derive(Default)]
struct AdaptiveScratch {
    candidate: Vec<u8>,
    best: Vec<u8>,
}

/// Try all filters and keep the one with the lowest score.
fn adaptive_filter(
    row: &[u8],
    prev_row: &[u8],
    stride: usize,
    output: &mut Vec<u8>,
    scratch: &mut AdaptiveScratch,
) {
    let mut best_filter = FilterType::None;
    let mut best_score = u64::MAX;

    for filter in FilterType::ALL {
        scratch.candidate.clear();
        filter_row(filter, row, prev_row, stride, &mut scratch.candidate);
        let score = score_filter(&scratch.candidate);
        if score < best_score {
            best_score = score;
            best_filter = filter;
            std::mem::swap(&mut scratch.best, &mut scratch.candidate);
            // A score of 0 means all zeros - can't do better
            if score == 0 {
                break;
            }
        }
    }

    output.push(best_filter as u8);
    output.extend_from_slice(&scratch.best);
}

/// Score a filtered row using sum of absolute values.
///
/// Lower scores typically result in better compression.
#[inline]
fn score_filter(filtered: &[u8]) -> u64 {
    filtered
        .iter()
        .map(|&b| (b as i8).unsigned_abs() as u64)
        .sum()
}
