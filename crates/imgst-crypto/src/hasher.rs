use imgst_types::ContentHash;

/// Hashes original image bytes for deduplication.
///
/// BLAKE3 over a fixed domain tag followed by the image bytes, so store
/// digests never coincide with a plain BLAKE3 of the same file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    pub const IMAGE: Self = Self {
        domain: "imgst-image-v1",
    };

    pub fn hash(&self, image: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(image);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::IMAGE
    }
}
