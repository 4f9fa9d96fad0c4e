use std::fmt;

/// Digest of an image's original bytes.
///
/// Inserting bytes whose digest matches a live image makes the new slot share
/// that image's stored original and any cached thumbnail or small variant.
/// Never-used slots carry the all-zero default.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Width of the hash field in a slot record.
    pub const LEN: usize = 32;

    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Bytes as written into the slot record.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex, as printed in store listings.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First four bytes in hex, for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
