//! Minimal helpers for the 32-byte-word ABI layout used by the attributes
//! transaction. Padding bytes are validated on reads: a uint64 or address
//! word with non-zero padding is rejected rather than silently truncated.

use crate::CodecError;
use alloy_primitives::{Address, B256, U256};

pub(crate) struct AbiReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AbiReader<'a> {
    pub(crate) const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.data.len() - self.pos < len {
            return Err(CodecError::UnexpectedEndOfData);
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Reads the 4-byte selector and compares it against the expected one.
    pub(crate) fn read_selector(&mut self, expected: [u8; 4]) -> Result<(), CodecError> {
        (self.take(4)? == expected).then_some(()).ok_or(CodecError::InvalidSelector)
    }

    /// Reads a uint64 from a 32-byte word, validating the 24 padding bytes.
    pub(crate) fn read_u64_word(&mut self) -> Result<u64, CodecError> {
        let word = self.take(32)?;
        if word[..24].iter().any(|b| *b != 0) {
            return Err(CodecError::InvalidPadding);
        }
        Ok(u64::from_be_bytes(word[24..32].try_into().expect("8 bytes")))
    }

    /// Reads a single byte.
    pub(crate) fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a big-endian uint64 from 8 raw bytes.
    pub(crate) fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().expect("8 bytes")))
    }

    /// Reads a big-endian uint32 from 4 raw bytes.
    pub(crate) fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().expect("4 bytes")))
    }

    /// Reads a uint256 from a 32-byte word.
    pub(crate) fn read_u256(&mut self) -> Result<U256, CodecError> {
        Ok(U256::from_be_slice(self.take(32)?))
    }

    /// Reads a 32-byte hash.
    pub(crate) fn read_b256(&mut self) -> Result<B256, CodecError> {
        Ok(B256::from_slice(self.take(32)?))
    }

    /// Reads an address from a 32-byte word, validating the 12 padding bytes.
    pub(crate) fn read_address(&mut self) -> Result<Address, CodecError> {
        let word = self.take(32)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(CodecError::InvalidPadding);
        }
        Ok(Address::from_slice(&word[12..32]))
    }

    /// Reads an ABI dynamic bytes tail: a 32-byte offset word (constant,
    /// skipped), a 32-byte length word and the data padded to a 32-byte
    /// boundary.
    pub(crate) fn read_abi_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let _offset = self.read_u256()?;
        let len = usize::try_from(self.read_u256()?).map_err(|_| CodecError::UnexpectedEndOfData)?;
        let data = self.take(len)?.to_vec();
        if len % 32 != 0 {
            let padding = self.take(32 - len % 32)?;
            if padding.iter().any(|b| *b != 0) {
                return Err(CodecError::InvalidPadding);
            }
        }
        Ok(data)
    }

    /// Reads the short bytes tail: a single uint64 length word followed by
    /// raw, unpadded data.
    pub(crate) fn read_abi_bytes_short(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_u64_word()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Consumes and returns all remaining bytes.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    /// Returns an error if any bytes remain unread.
    pub(crate) fn finish(&self) -> Result<(), CodecError> {
        (self.pos == self.data.len()).then_some(()).ok_or(CodecError::TrailingBytes)
    }
}

pub(crate) fn write_u64_word(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&[0u8; 24]);
    buf.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn write_u256(buf: &mut Vec<u8>, value: U256) {
    buf.extend_from_slice(&value.to_be_bytes::<32>());
}

pub(crate) fn write_address(buf: &mut Vec<u8>, address: Address) {
    buf.extend_from_slice(address.into_word().as_slice());
}

pub(crate) fn write_abi_bytes(buf: &mut Vec<u8>, data: &[u8], offset: u64) {
    write_u256(buf, U256::from(offset));
    write_u256(buf, U256::from(data.len()));
    buf.extend_from_slice(data);
    if data.len() % 32 != 0 {
        buf.extend(std::iter::repeat_n(0u8, 32 - data.len() % 32));
    }
}

pub(crate) fn write_abi_bytes_short(buf: &mut Vec<u8>, data: &[u8]) {
    write_u64_word(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_word_rejects_dirty_padding() {
        let mut word = [0u8; 32];
        word[23] = 1;
        word[31] = 7;
        let mut reader = AbiReader::new(&word);
        assert_eq!(reader.read_u64_word(), Err(CodecError::InvalidPadding));
    }

    #[test]
    fn test_address_word_roundtrip() {
        let address = Address::repeat_byte(0xab);
        let mut buf = Vec::new();
        write_address(&mut buf, address);

        let mut reader = AbiReader::new(&buf);
        assert_eq!(reader.read_address(), Ok(address));
        assert_eq!(reader.finish(), Ok(()));
    }

    #[test]
    fn test_abi_bytes_pads_to_word_boundary() {
        let mut buf = Vec::new();
        write_abi_bytes(&mut buf, &[1, 2, 3], 0x40);
        // offset + length + one padded word.
        assert_eq!(buf.len(), 96);

        let mut reader = AbiReader::new(&buf);
        assert_eq!(reader.read_abi_bytes(), Ok(vec![1, 2, 3]));
        assert_eq!(reader.finish(), Ok(()));
    }

    #[test]
    fn test_short_bytes_are_unpadded() {
        let mut buf = Vec::new();
        write_abi_bytes_short(&mut buf, &[9, 9, 9]);
        assert_eq!(buf.len(), 35);

        let mut reader = AbiReader::new(&buf);
        assert_eq!(reader.read_abi_bytes_short(), Ok(vec![9, 9, 9]));
        assert_eq!(reader.finish(), Ok(()));
    }
}
