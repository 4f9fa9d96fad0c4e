//! Content hashing for ImgStore.
//!
//! Deduplication compares images by a 32-byte digest of their original
//! bytes. The digest wraps BLAKE3; no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
