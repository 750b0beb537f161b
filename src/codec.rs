//! Big-endian byte emission.

use crate::types::{Fixed, LongDateTime, Tag, Version16Dot16};

/// A growable byte buffer that all encoding writes into.
///
/// Every multi-byte value is written big-endian; padding bytes are always
/// zero.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Buffer {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.bytes.push(value as u8);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i16(&mut self, value: i16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Write the low three bytes of `value`.
    pub fn put_u24(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes()[1..]);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_fixed(&mut self, value: Fixed) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_tag(&mut self, value: Tag) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_version(&mut self, value: Version16Dot16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_datetime(&mut self, value: LongDateTime) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Zero-fill until the total length is a multiple of `align`.
    pub fn pad_to_align(&mut self, align: usize) {
        self.pad_from(0, align);
    }

    /// Zero-fill until the length written since `start` is a multiple of
    /// `align`. A no-op for alignments below two.
    pub fn pad_from(&mut self, start: usize, align: usize) {
        if align < 2 {
            return;
        }
        let written = self.bytes.len() - start;
        let rem = written % align;
        if rem != 0 {
            self.bytes.resize(self.bytes.len() + align - rem, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_scalars() {
        let mut buf = Buffer::new();
        buf.put_u16(0x0102);
        buf.put_i16(-2);
        buf.put_u24(0xAA_0304_05);
        buf.put_u32(0x06070809);
        assert_eq!(
            buf.as_slice(),
            &[0x01, 0x02, 0xFF, 0xFE, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]
        );
    }

    #[test]
    fn padding() {
        let mut buf = Buffer::new();
        buf.put_u8(0xFF);
        buf.pad_to_align(4);
        assert_eq!(buf.as_slice(), &[0xFF, 0, 0, 0]);
        // already aligned: nothing to do
        buf.pad_to_align(4);
        assert_eq!(buf.len(), 4);
        buf.pad_to_align(0);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn relative_padding() {
        let mut buf = Buffer::new();
        buf.put_u8(1);
        let start = buf.len();
        buf.put_u8(2);
        buf.pad_from(start, 2);
        assert_eq!(buf.as_slice(), &[1, 2, 0]);
    }
}
