//! Bit-level cursor over a byte buffer.
//!
//! Fields are 1 to 8 bits wide and filled from the most significant bit of
//! each byte, so a `4`-bit field followed by another `4`-bit field puts the
//! first in the high nibble. No field may straddle a byte boundary.
//!
//! ## Errors
//!
//! Encoding runs against a buffer sized exactly by the format, so running
//! past its end on write is a bug and panics, as does a straddling field or
//! a raw transfer from an unaligned position. Reading past the end of an
//! untrusted record is reported as `FormatError::UnexpectedEnd`.
//!
//! ```
//! use tile_rules::codec::BitCursor;
//!
//! let mut writer = BitCursor::new(vec![0u8; 1]);
//! writer.write_field(0x3, 4);
//! writer.write_field(0xA, 4);
//! assert_eq!(writer.into_inner(), vec![0x3A]);
//!
//! let mut reader = BitCursor::new(&[0x3A][..]);
//! assert_eq!(reader.read_field(4).unwrap(), 0x3);
//! assert_eq!(reader.read_field(4).unwrap(), 0xA);
//! assert!(reader.read_field(1).is_err());
//! ```

use crate::core::{FormatError, FormatResult};

/// A cursor over `B`, counted in bits.
///
/// One cursor owns one encode or decode pass; it is created per call and
/// never shared.
#[derive(Clone, Debug)]
pub struct BitCursor<B> {
    buf: B,
    bit: usize,
}

impl<B: AsRef<[u8]>> BitCursor<B> {
    /// Create a cursor positioned at the first bit of `buf`.
    pub fn new(buf: B) -> Self {
        Self { buf, bit: 0 }
    }

    /// Current position in bits.
    #[must_use]
    pub fn position(&self) -> usize {
        self.bit
    }

    /// Current byte offset; the byte being filled if mid-byte.
    #[must_use]
    pub fn byte_offset(&self) -> usize {
        self.bit / 8
    }

    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.bit % 8 == 0
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.bit >= self.buf.as_ref().len() * 8
    }

    /// Bytes left after the current position, rounding a partial byte down.
    #[must_use]
    pub fn remaining_bytes(&self) -> usize {
        self.buf.as_ref().len().saturating_sub(self.bit.div_ceil(8))
    }

    fn check_field(&self, width: u32) -> u32 {
        assert!((1..=8).contains(&width), "field width {width} outside 1..=8");
        let offset = (self.bit % 8) as u32;
        assert!(
            offset + width <= 8,
            "{width}-bit field at bit {} straddles a byte boundary",
            self.bit
        );
        8 - offset - width
    }

    /// Read a `width`-bit unsigned field.
    ///
    /// Panics if the field would straddle a byte boundary.
    pub fn read_field(&mut self, width: u32) -> FormatResult<u8> {
        let shift = self.check_field(width);
        let index = self.byte_offset();
        let byte = *self
            .buf
            .as_ref()
            .get(index)
            .ok_or(FormatError::UnexpectedEnd { offset: index })?;
        let mask = ((1u16 << width) - 1) as u8;
        self.bit += width as usize;
        Ok((byte >> shift) & mask)
    }

    /// Read `count` whole bytes.
    ///
    /// Panics if the cursor is not byte-aligned.
    pub fn read_raw(&mut self, count: usize) -> FormatResult<&[u8]> {
        assert!(self.is_aligned(), "raw read at unaligned bit {}", self.bit);
        let start = self.byte_offset();
        let end = start + count;
        let buf = self.buf.as_ref();
        if end > buf.len() {
            return Err(FormatError::UnexpectedEnd { offset: buf.len() });
        }
        self.bit = end * 8;
        Ok(&buf[start..end])
    }

    /// Give back the underlying buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitCursor<B> {
    /// Write the low `width` bits of `value`; higher bits are dropped.
    ///
    /// Panics if the field would straddle a byte boundary or run past the
    /// end of the buffer.
    pub fn write_field(&mut self, value: u8, width: u32) {
        let shift = self.check_field(width);
        let index = self.byte_offset();
        let buf = self.buf.as_mut();
        assert!(index < buf.len(), "write past end of {}-byte buffer", buf.len());
        let mask = ((1u16 << width) - 1) as u8;
        let byte = &mut buf[index];
        *byte = (*byte & !(mask << shift)) | ((value & mask) << shift);
        self.bit += width as usize;
    }

    /// Write `bytes` verbatim.
    ///
    /// Panics if the cursor is not byte-aligned or the bytes do not fit.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        assert!(self.is_aligned(), "raw write at unaligned bit {}", self.bit);
        let start = self.byte_offset();
        let end = start + bytes.len();
        let buf = self.buf.as_mut();
        assert!(end <= buf.len(), "write past end of {}-byte buffer", buf.len());
        buf[start..end].copy_from_slice(bytes);
        self.bit = end * 8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_fill_from_high_bits() {
        let mut cursor = BitCursor::new(vec![0u8; 2]);
        cursor.write_field(1, 1);
        cursor.write_field(0, 3);
        cursor.write_field(0xF, 4);
        cursor.write_field(0xAB, 8);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.into_inner(), vec![0b1000_1111, 0xAB]);
    }

    #[test]
    fn test_write_masks_value() {
        let mut cursor = BitCursor::new(vec![0u8; 1]);
        cursor.write_field(0xFF, 4);
        cursor.write_field(0x12, 4);
        assert_eq!(cursor.into_inner(), vec![0xF2]);
    }

    #[test]
    fn test_read_fields() {
        let mut cursor = BitCursor::new(&[0b1010_0110u8][..]);
        assert_eq!(cursor.read_field(2).unwrap(), 0b10);
        assert_eq!(cursor.read_field(2).unwrap(), 0b10);
        assert_eq!(cursor.read_field(4).unwrap(), 0b0110);
        assert_eq!(cursor.position(), 8);
        assert_eq!(
            cursor.read_field(4),
            Err(FormatError::UnexpectedEnd { offset: 1 })
        );
    }

    #[test]
    fn test_raw_transfer() {
        let mut cursor = BitCursor::new(vec![0u8; 3]);
        cursor.write_field(0x7, 8);
        cursor.write_raw(&[0x11, 0x22]);
        assert_eq!(cursor.remaining_bytes(), 0);
        let bytes = cursor.into_inner();
        assert_eq!(bytes, vec![0x07, 0x11, 0x22]);

        let mut reader = BitCursor::new(bytes.as_slice());
        assert_eq!(reader.read_field(8).unwrap(), 7);
        assert_eq!(reader.read_raw(2).unwrap(), &[0x11, 0x22]);
        assert!(reader.read_raw(1).is_err());
        assert_eq!(reader.read_raw(0).unwrap(), &[] as &[u8]);
    }

    #[test]
    #[should_panic(expected = "straddles a byte boundary")]
    fn test_straddling_field_panics() {
        let mut cursor = BitCursor::new(vec![0u8; 2]);
        cursor.write_field(0, 6);
        cursor.write_field(0, 4);
    }

    #[test]
    #[should_panic(expected = "write past end")]
    fn test_write_overrun_panics() {
        let mut cursor = BitCursor::new(vec![0u8; 1]);
        cursor.write_field(0, 8);
        cursor.write_field(0, 1);
    }

    #[test]
    #[should_panic(expected = "unaligned")]
    fn test_unaligned_raw_panics() {
        let mut cursor = BitCursor::new(vec![0u8; 2]);
        cursor.write_field(0, 4);
        cursor.write_raw(&[1]);
    }
}
