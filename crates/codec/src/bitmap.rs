/// A growable bit-vector marking which derived deposits were excluded from a
/// block.
///
/// The serialized form is byte-for-byte what travels in the attributes
/// transaction tail: bits packed MSB-first. An empty bitmap serializes to
/// nothing and is distinct from an explicitly-zero bitmap, which serializes
/// to zero bytes; [`Bitmap::from_bytes`] returns `None` for the former.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bytes: Vec<u8>,
}

impl Bitmap {
    /// Returns a bitmap with capacity for at least `bits` bits, all unset.
    pub fn with_capacity(bits: usize) -> Self {
        Self { bytes: vec![0; bits.div_ceil(8)] }
    }

    /// Returns a bitmap from its serialized form, or `None` for empty input.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        (!bytes.is_empty()).then(|| Self { bytes: bytes.to_vec() })
    }

    /// Returns the serialized form of the bitmap.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Sets the bit at `index`, growing the bitmap if needed. Growth never
    /// clears previously-set bits.
    pub fn set(&mut self, index: usize) {
        let byte = index / 8;
        if byte >= self.bytes.len() {
            self.bytes.resize(byte + 1, 0);
        }
        self.bytes[byte] |= 0x80 >> (index % 8);
    }

    /// Returns whether the bit at `index` is set. Out-of-range bits are unset.
    pub fn test(&self, index: usize) -> bool {
        self.bytes.get(index / 8).is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
    }

    /// Returns the number of set bits.
    pub fn count(&self) -> usize {
        self.bytes.iter().map(|byte| byte.count_ones() as usize).sum()
    }
}
