use std::io::{Read, Seek};

use crate::FormatError;
use crate::common::reader::BinReader;

/// Bit-level reader over a byte stream, as used by compressed animation
/// channels. The pool is replenished with big-endian 32-bit words and bits
/// are consumed starting from the least significant end of each word.
pub struct BitReader<'a, R: Read + Seek> {
    source: &'a mut BinReader<R>,
    pool: u32,
    bits_remaining: u32,
}

impl<'a, R: Read + Seek> BitReader<'a, R> {
    pub fn new(source: &'a mut BinReader<R>) -> Self {
        BitReader {
            source,
            pool: 0,
            bits_remaining: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, FormatError> {
        Ok(self.read_unsigned(1)? != 0)
    }

    /// Reads `count` bits (1 to 32) as an unsigned value.
    pub fn read_unsigned(&mut self, count: u32) -> Result<u32, FormatError> {
        debug_assert!(count >= 1 && count <= 32);
        let mut out: u32 = 0;
        let mut needed = count;

        while needed > 0 {
            if self.bits_remaining == 0 {
                self.pool = self.source.read_u32()?;
                self.bits_remaining = 32;
            }

            let take = needed.min(self.bits_remaining);
            let mask = if take == 32 { u32::MAX } else { (1 << take) - 1 };
            out |= (self.pool & mask) << (count - needed);

            self.pool = self.pool.checked_shr(take).unwrap_or(0);
            self.bits_remaining -= take;
            needed -= take;
        }

        Ok(out)
    }

    /// Reads `count` bits and sign-extends from bit `count - 1`. Key deltas
    /// are stored this way.
    pub fn read_signed(&mut self, count: u32) -> Result<i32, FormatError> {
        let raw = self.read_unsigned(count)?;
        let sign_bit = 1u32 << (count - 1);
        if raw & sign_bit != 0 {
            Ok((raw | !(sign_bit - 1)) as i32)
        } else {
            Ok(raw as i32)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::reader::BinReader;

    #[test]
    fn bits_come_from_the_low_end_of_each_word() -> anyhow::Result<()> {
        // Word 0x000005A3: low bits are 0b0101_1010_0011.
        let mut rdr = BinReader::big_endian(Cursor::new(vec![0x00, 0x00, 0x05, 0xA3]));
        let mut bits = BitReader::new(&mut rdr);
        assert_eq!(bits.read_unsigned(4)?, 0x3);
        assert_eq!(bits.read_unsigned(4)?, 0xA);
        assert_eq!(bits.read_unsigned(4)?, 0x5);
        Ok(())
    }

    #[test]
    fn values_straddle_word_boundaries() -> anyhow::Result<()> {
        let mut rdr = BinReader::big_endian(Cursor::new(vec![
            0x80, 0x00, 0x00, 0x01, // bit 0 and bit 31 set
            0x00, 0x00, 0x00, 0x01,
        ]));
        let mut bits = BitReader::new(&mut rdr);
        assert!(bits.read_bit()?);
        // 30 zero bits, then the top bit of word one plus the bottom bit of
        // word two as a two-bit value.
        assert_eq!(bits.read_unsigned(30)?, 0);
        assert_eq!(bits.read_unsigned(2)?, 0b11);
        Ok(())
    }

    #[test]
    fn signed_reads_extend_the_top_bit() -> anyhow::Result<()> {
        // Low 3 bits 0b111 == -1 as a 3-bit signed value.
        let mut rdr = BinReader::big_endian(Cursor::new(vec![0x00, 0x00, 0x00, 0x07]));
        let mut bits = BitReader::new(&mut rdr);
        assert_eq!(bits.read_signed(3)?, -1);
        Ok(())
    }
}
