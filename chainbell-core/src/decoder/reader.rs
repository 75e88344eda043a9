//! Bounds-checked cursor over an event payload, and its encoding counterpart.
//!
//! Every read returns `None` instead of panicking when the buffer is too short
//! or a field is malformed.

use crate::address::{self, Address};

pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        self.take_array::<1>().map(|[b]| b)
    }

    pub(crate) fn read_u32(&mut self) -> Option<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub(crate) fn read_u64(&mut self) -> Option<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub(crate) fn read_i64(&mut self) -> Option<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    pub(crate) fn read_bool(&mut self) -> Option<bool> {
        match self.read_u8()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    /// Read a 32-byte address; its base58 form must pass the structural check.
    pub(crate) fn read_address(&mut self) -> Option<Address> {
        let address = Address::new(self.take_array()?);
        address::is_well_formed(&address.to_base58()).then_some(address)
    }

    /// Read a `u32` length-prefixed UTF-8 string.
    ///
    /// Lengths that are negative as `i32` or exceed the remaining bytes are
    /// rejected before any allocation.
    pub(crate) fn read_string(&mut self) -> Option<String> {
        let len = self.read_u32()?;
        let len = usize::try_from(i32::try_from(len).ok()?).ok()?;
        if len > self.remaining() {
            return None;
        }
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }

    /// Read a presence byte followed by a string when present.
    pub(crate) fn read_optional_string(&mut self) -> Option<Option<String>> {
        match self.read_u8()? {
            0 => Some(None),
            1 => self.read_string().map(Some),
            _ => None,
        }
    }
}

#[derive(Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn with_discriminator(discriminator: [u8; 8]) -> Self {
        Self {
            buf: discriminator.to_vec(),
        }
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn put_bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(u8::from(value));
        self
    }

    pub(crate) fn put_address(&mut self, address: &Address) -> &mut Self {
        self.buf.extend_from_slice(address.as_bytes());
        self
    }

    /// Strings longer than `u32::MAX` bytes are not representable and are
    /// truncated to an empty string.
    pub(crate) fn put_string(&mut self, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        match u32::try_from(bytes.len()) {
            Ok(len) => {
                self.buf.extend_from_slice(&len.to_le_bytes());
                self.buf.extend_from_slice(bytes);
            }
            Err(_) => self.buf.extend_from_slice(&0u32.to_le_bytes()),
        }
        self
    }

    pub(crate) fn put_optional_string(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(s) => {
                self.buf.push(1);
                self.put_string(s)
            }
            None => {
                self.buf.push(0);
                self
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_past_end_return_none() {
        let mut reader = ByteReader::new(&[1, 2, 3], 0);
        assert_eq!(reader.read_u64(), None);
        // a failed read does not advance the cursor
        assert_eq!(reader.remaining(), 3);
        assert_eq!(reader.read_u8(), Some(1));
    }

    #[test]
    fn test_little_endian_integers() {
        let bytes = [0x01, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let mut reader = ByteReader::new(&bytes, 0);
        assert_eq!(reader.read_u64(), Some(1));
        assert_eq!(reader.read_i64(), Some(-1));
    }

    #[test]
    fn test_string_length_larger_than_buffer() {
        let mut bytes = 10u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert_eq!(ByteReader::new(&bytes, 0).read_string(), None);
    }

    #[test]
    fn test_string_length_negative_as_i32() {
        let mut bytes = 0x8000_0000u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert_eq!(ByteReader::new(&bytes, 0).read_string(), None);
    }

    #[test]
    fn test_string_invalid_utf8() {
        let mut bytes = 2u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xc3, 0x28]);
        assert_eq!(ByteReader::new(&bytes, 0).read_string(), None);
    }

    #[test]
    fn test_optional_string_presence_byte() {
        assert_eq!(ByteReader::new(&[0], 0).read_optional_string(), Some(None));
        assert_eq!(ByteReader::new(&[2], 0).read_optional_string(), None);

        let mut writer = ByteWriter::default();
        writer.put_optional_string(Some("ref-1"));
        let bytes = writer.finish();
        assert_eq!(
            ByteReader::new(&bytes, 0).read_optional_string(),
            Some(Some("ref-1".to_string()))
        );
    }

    #[test]
    fn test_bool_rejects_other_values() {
        assert_eq!(ByteReader::new(&[1], 0).read_bool(), Some(true));
        assert_eq!(ByteReader::new(&[0], 0).read_bool(), Some(false));
        assert_eq!(ByteReader::new(&[7], 0).read_bool(), None);
    }
}
