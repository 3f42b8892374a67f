//! Bit-level packing for scanline samples.
//!
//! PNG stores samples most-significant-bit first and never lets a scanline
//! share a byte with the next one, so a row is packed as one continuous bit
//! string and its final byte is padded with zero bits.

use crate::error::{Error, Result};

/// A bit writer that packs bits into bytes, MSB first.
#[derive(Debug)]
pub struct BitWriter {
    buffer: Vec<u8>,
    current_byte: u8,
    bit_position: u8,
}

impl BitWriter {
    /// Create a new bit writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a new bit writer with specified byte capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            current_byte: 0,
            bit_position: 0,
        }
    }

    /// Write the low `num_bits` of `value`, most significant bit first.
    ///
    /// # Arguments
    /// * `value` - The value to write (only lower `num_bits` are used)
    /// * `num_bits` - Number of bits to write (0-32)
    #[inline]
    pub fn write_bits(&mut self, value: u32, num_bits: u8) {
        debug_assert!(num_bits <= 32);

        let mut remaining = num_bits;
        while remaining > 0 {
            let available = 8 - self.bit_position;
            let to_write = remaining.min(available);
            let shift = remaining - to_write;
            let mask = (1u32 << to_write) - 1;
            let bits = ((value >> shift) & mask) as u8;

            self.current_byte |= bits << (available - to_write);
            self.bit_position += to_write;
            remaining -= to_write;

            if self.bit_position == 8 {
                self.buffer.push(self.current_byte);
                self.current_byte = 0;
                self.bit_position = 0;
            }
        }
    }

    /// Flush any remaining bits, padding with zeros.
    pub fn flush(&mut self) {
        if self.bit_position > 0 {
            self.buffer.push(self.current_byte);
            self.current_byte = 0;
            self.bit_position = 0;
        }
    }

    /// Flush and return the written bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.buffer
    }

    /// Returns length in bytes (not counting partial byte).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing has been written, including partial bits.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.bit_position == 0
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads fixed-width values from a byte slice, MSB first.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Start reading at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bits not yet consumed.
    #[inline]
    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    /// Read the next `num_bits` (0-32) as a right-aligned value.
    pub fn read_bits(&mut self, num_bits: u8) -> Result<u32> {
        debug_assert!(num_bits <= 32);
        let available = self.remaining_bits();
        if num_bits as usize > available {
            return Err(Error::InsufficientData {
                needed: num_bits as usize,
                available,
            });
        }

        let mut value = 0u32;
        let mut remaining = num_bits;
        while remaining > 0 {
            let byte = self.data[self.position / 8];
            let offset = (self.position % 8) as u8;
            let in_byte = 8 - offset;
            let take = remaining.min(in_byte);
            let bits = (byte >> (in_byte - take)) & (((1u16 << take) - 1) as u8);

            value = (value << take) | bits as u32;
            self.position += take as usize;
            remaining -= take;
        }
        Ok(value)
    }
}

/// Split off the first `n` bits of `data`.
///
/// Returns `(value, remainder)`: `value` holds the extracted bits right-aligned
/// in `ceil(n / 8)` bytes, and `remainder` holds the bits after them shifted to
/// start at a byte boundary and zero-padded at the end.
///
/// Fails with [`Error::InsufficientData`] if `data` holds fewer than `n` bits.
pub fn extract_bits(n: usize, data: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let total = data.len() * 8;
    if n > total {
        return Err(Error::InsufficientData {
            needed: n,
            available: total,
        });
    }
    if n == 0 {
        return Ok((Vec::new(), data.to_vec()));
    }

    let mut reader = BitReader::new(data);

    let value_bytes = n.div_ceil(8);
    let mut value = BitWriter::with_capacity(value_bytes);
    value.write_bits(0, (value_bytes * 8 - n) as u8);
    copy_bits(&mut reader, &mut value, n)?;

    let rest = total - n;
    let mut remainder = BitWriter::with_capacity(rest.div_ceil(8));
    copy_bits(&mut reader, &mut remainder, rest)?;

    Ok((value.finish(), remainder.finish()))
}

fn copy_bits(reader: &mut BitReader<'_>, writer: &mut BitWriter, mut count: usize) -> Result<()> {
    while count > 0 {
        let step = count.min(8) as u8;
        let bits = reader.read_bits(step)?;
        writer.write_bits(bits, step);
        count -= step as usize;
    }
    Ok(())
}

/// Pack samples of `bit_depth` bits each into one zero-padded bit string.
pub fn pack_samples(samples: &[u16], bit_depth: u8) -> Vec<u8> {
    debug_assert!(
        matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
        "pack_samples expected bit depth 1, 2, 4, 8, or 16"
    );
    let mut writer = BitWriter::with_capacity((samples.len() * bit_depth as usize).div_ceil(8));
    for &sample in samples {
        writer.write_bits(sample as u32, bit_depth);
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expand bytes to a vector of bits, MSB first.
    fn to_bits(data: &[u8]) -> Vec<u8> {
        data.iter()
            .flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1))
            .collect()
    }

    #[test]
    fn test_bit_writer_msb_first() {
        let mut w = BitWriter::new();
        w.write_bits(0b1, 1);
        w.write_bits(0b01, 2);
        w.write_bits(0b10110, 5);
        assert_eq!(w.finish(), vec![0b1011_0110]);
    }

    #[test]
    fn test_bit_writer_cross_byte() {
        let mut w = BitWriter::new();
        w.write_bits(0xABC, 12);
        assert_eq!(w.len(), 1);
        assert_eq!(w.finish(), vec![0xAB, 0xC0]);
    }

    #[test]
    fn test_bit_writer_len_and_is_empty() {
        let mut w = BitWriter::new();
        assert!(w.is_empty());
        w.write_bits(1, 1);
        assert!(!w.is_empty());
        assert_eq!(w.len(), 0);
        w.write_bits(0, 7);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_bit_reader_reads_across_bytes() {
        let data = [0xAB, 0xCD];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bits(4).unwrap(), 0xA);
        assert_eq!(r.read_bits(8).unwrap(), 0xBC);
        assert_eq!(r.remaining_bits(), 4);
        assert_eq!(r.read_bits(4).unwrap(), 0xD);
        assert!(matches!(
            r.read_bits(1),
            Err(Error::InsufficientData {
                needed: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn test_extract_bits_zero() {
        let data = [0x12, 0x34];
        let (value, rest) = extract_bits(0, &data).unwrap();
        assert!(value.is_empty());
        assert_eq!(rest, data.to_vec());
    }

    #[test]
    fn test_extract_bits_full_length() {
        let data = [0x12, 0x34];
        let (value, rest) = extract_bits(16, &data).unwrap();
        assert_eq!(value, data.to_vec());
        assert!(rest.is_empty());
    }

    #[test]
    fn test_extract_bits_nibble() {
        let (value, rest) = extract_bits(4, &[0xAB, 0xCD]).unwrap();
        assert_eq!(value, vec![0x0A]);
        assert_eq!(rest, vec![0xBC, 0xD0]);
    }

    #[test]
    fn test_extract_bits_twelve_is_right_aligned() {
        let (value, rest) = extract_bits(12, &[0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(value, vec![0x0A, 0xBC]);
        assert_eq!(rest, vec![0xDE, 0xF0]);
    }

    #[test]
    fn test_extract_bits_too_many() {
        assert_eq!(
            extract_bits(17, &[0, 0]),
            Err(Error::InsufficientData {
                needed: 17,
                available: 16
            })
        );
    }

    #[test]
    fn test_extract_bits_reconstructs_data() {
        let data = [0b1010_0101, 0xFF, 0x00, 0x3C];
        let total = data.len() * 8;
        for n in [0, 1, 4, 8, 12, 16, total] {
            let (value, rest) = extract_bits(n, &data).unwrap();
            let value_bits = to_bits(&value);
            let mut bits = value_bits[value_bits.len() - n..].to_vec();
            bits.extend_from_slice(&to_bits(&rest)[..total - n]);
            assert_eq!(bits, to_bits(&data), "n = {n}");
        }
    }

    #[test]
    fn test_pack_samples() {
        // 1-bit packing: [1,0,1,0,1,0,1,0] -> 0b10101010
        assert_eq!(pack_samples(&[1, 0, 1, 0, 1, 0, 1, 0], 1), vec![0b1010_1010]);
        // 2-bit packing: [0,1,2,3] -> 00 01 10 11
        assert_eq!(pack_samples(&[0, 1, 2, 3], 2), vec![0b0001_1011]);
        // 4-bit packing with padding
        assert_eq!(pack_samples(&[0xA, 0xB, 0xC], 4), vec![0xAB, 0xC0]);
        assert_eq!(pack_samples(&[0x12, 0x34], 8), vec![0x12, 0x34]);
        assert_eq!(pack_samples(&[0x1234, 0xFFFF], 16), vec![0x12, 0x34, 0xFF, 0xFF]);
    }

    #[test]
    fn test_pack_samples_partial_byte() {
        assert_eq!(pack_samples(&[1, 0, 1], 1), vec![0b1010_0000]);
        assert_eq!(pack_samples(&[1, 2], 2), vec![0b0110_0000]);
    }

    #[test]
    fn test_pack_then_read_back() {
        let samples = [3u16, 0, 2, 1, 3];
        let packed = pack_samples(&samples, 2);
        let mut r = BitReader::new(&packed);
        for &s in &samples {
            assert_eq!(r.read_bits(2).unwrap(), s as u32);
        }
    }
}
