//! CRC-32 checksum used for PNG chunk integrity (CRC-32/ISO-HDLC).

/// Byte-wise lookup table for the reflected polynomial 0xEDB88320.
static CRC_TABLE: std::sync::LazyLock<[u32; 256]> = std::sync::LazyLock::new(|| {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = if (crc & 1) != 0 {
                (crc >> 1) ^ 0xEDB88320
            } else {
                crc >> 1
            };
        }
        *entry = crc;
    }
    table
});

/// Calculate the CRC-32 of `data` in one call.
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.finalize()
}

/// CRC of a chunk: computed over the 4-byte type tag followed by the body.
#[inline]
pub fn chunk_crc(chunk_type: &[u8; 4], body: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(chunk_type);
    crc.update(body);
    crc.finalize()
}

/// Calculate CRC32 incrementally.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFF_FFFF }
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        let table = &*CRC_TABLE;
        for &byte in data {
            let index = ((self.crc ^ byte as u32) & 0xFF) as usize;
            self.crc = (self.crc >> 8) ^ table[index];
        }
    }

    /// Finalize and return the CRC value.
    #[inline]
    pub fn finalize(self) -> u32 {
        self.crc ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_chunk_crc_matches_concatenation() {
        let body = b"\x00\x00\x00\x01\x00\x00\x00\x01\x08\x02\x00\x00\x00";
        let mut joined = b"IHDR".to_vec();
        joined.extend_from_slice(body);
        assert_eq!(chunk_crc(b"IHDR", body), crc32(&joined));
    }

    #[test]
    fn test_crc32_iend() {
        assert_eq!(chunk_crc(b"IEND", &[]), 0xAE426082);
    }

    #[test]
    fn test_single_bit_flip_changes_crc() {
        let body = b"hello world".to_vec();
        let base = chunk_crc(b"tEXt", &body);
        for byte in 0..body.len() {
            for bit in 0..8 {
                let mut flipped = body.clone();
                flipped[byte] ^= 1 << bit;
                assert_ne!(chunk_crc(b"tEXt", &flipped), base);
            }
        }
    }
}
