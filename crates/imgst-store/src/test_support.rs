//! Deterministic in-memory codec for tests.
//!
//! "Images" are `FAKE` + width + height (little-endian u32) + 16 seed bytes.
//! Every call is counted so tests can assert how often the codec ran.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use imgst_codec::{scaled_dimensions, CodecError, CodecResult, Decoded, ImageCodec};

use crate::config::StoreConfig;
use crate::store::ImageStore;

const MAGIC: &[u8; 4] = b"FAKE";

pub fn fake_image(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(28);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.extend_from_slice(&[seed; 16]);
    buf
}

#[derive(Debug, Default)]
pub struct CallLog {
    decodes: AtomicUsize,
    resizes: AtomicUsize,
    encodes: AtomicUsize,
    fail_encodes: AtomicBool,
}

impl CallLog {
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    pub fn resizes(&self) -> usize {
        self.resizes.load(Ordering::SeqCst)
    }

    pub fn encodes(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.decodes() + self.resizes() + self.encodes()
    }

    pub fn fail_encodes(&self, fail: bool) {
        self.fail_encodes.store(fail, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeCodec {
    calls: Arc<CallLog>,
}

impl FakeCodec {
    pub fn calls(&self) -> Arc<CallLog> {
        Arc::clone(&self.calls)
    }
}

impl ImageCodec for FakeCodec {
    type Image = u8;

    fn decode(&self, bytes: &[u8]) -> CodecResult<Decoded<u8>> {
        self.calls.decodes.fetch_add(1, Ordering::SeqCst);
        if bytes.len() < 13 || &bytes[..4] != MAGIC {
            return Err(CodecError::Decode("not a fake image".into()));
        }
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Ok(Decoded {
            width: word(4),
            height: word(8),
            image: bytes[12],
        })
    }

    fn resize(&self, image: &Decoded<u8>, factor: f64) -> CodecResult<Decoded<u8>> {
        self.calls.resizes.fetch_add(1, Ordering::SeqCst);
        let (width, height) = scaled_dimensions(image.width, image.height, factor);
        Ok(Decoded {
            width,
            height,
            image: image.image,
        })
    }

    fn encode(&self, image: &Decoded<u8>) -> CodecResult<Vec<u8>> {
        self.calls.encodes.fetch_add(1, Ordering::SeqCst);
        if self.calls.fail_encodes.load(Ordering::SeqCst) {
            return Err(CodecError::Encode("injected failure".into()));
        }
        Ok(fake_image(image.width, image.height, image.image))
    }
}

/// A fresh store at `<tempdir>/db.imgst` with 64x64 thumbnails and 256x256
/// small variants.
pub fn fake_store(capacity: u32) -> (tempfile::TempDir, ImageStore<FakeCodec>, Arc<CallLog>) {
    let dir = tempfile::tempdir().unwrap();
    let codec = FakeCodec::default();
    let calls = codec.calls();
    let config = StoreConfig {
        capacity,
        ..StoreConfig::default()
    };
    let store = ImageStore::create_with_codec(&dir.path().join("db.imgst"), &config, codec).unwrap();
    (dir, store, calls)
}
