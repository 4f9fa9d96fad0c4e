//! Single-file image store.
//!
//! An ImgStore file holds up to `capacity` JPEG images, each under an opaque
//! identifier, at three resolutions: the original bytes, plus a small and a
//! thumbnail variant derived on first read and cached in the same file.
//!
//! # Layout
//!
//! ```text
//! [ header | slot 0 | slot 1 | ... | slot capacity-1 | blob region ... ]
//! ```
//!
//! The header and slot table are fixed-size records (see [`layout`]). The
//! blob region only ever grows; deletes leave tombstones behind and
//! [`compact`] reclaims them.
//!
//! # Pieces
//!
//! - [`StoreFile`] -- the open file, its header, and the in-memory slot table
//! - [`ImageStore`] -- insert / delete / read / list on top of a [`StoreFile`]
//! - [`dedup_candidate`] -- identical content is stored once and shared
//! - [`ImageStore::ensure_variant`] -- fill-on-miss cache for derived resolutions
//! - [`compact`] -- rewrite without tombstones or orphaned bytes
//!
//! # Rules
//!
//! 1. `num_files` always equals the number of live slots after an operation
//!    returns.
//! 2. A slot is persisted before the header that counts it.
//! 3. Bytes in the blob region are never overwritten in place.
//! 4. A materialized variant is never recomputed.

mod cache;
pub mod compact;
pub mod config;
mod crud;
pub mod dedup;
pub mod error;
pub mod handle;
pub mod layout;
mod lookup;
pub mod store;

#[cfg(test)]
mod test_support;

pub use compact::{compact, CompactReport};
pub use config::{OpenMode, StoreConfig};
pub use crud::ListedImage;
pub use dedup::{dedup_candidate, DedupOutcome};
pub use error::{StoreError, StoreResult};
pub use handle::StoreFile;
pub use imgst_types::{ContentHash, Dimensions, ImageId, Resolution};
pub use layout::{Header, Slot, Validity, Variant};
pub use store::ImageStore;
