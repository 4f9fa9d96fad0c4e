//! Foundation types for ImgStore.
//!
//! Every other ImgStore crate depends on `imgst-types`. The types here are
//! plain values with no I/O: they describe what a store holds, not how it is
//! laid out on disk.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- 32-byte digest of an image's original bytes
//! - [`Resolution`] -- the three cached resolutions (thumbnail, small, original)
//! - [`ImageId`] -- validated image identifier (at most 127 bytes)
//! - [`Dimensions`] -- a width/height box used for resize targets

pub mod error;
pub mod hash;
pub mod image_id;
pub mod resolution;

pub use error::TypeError;
pub use hash::ContentHash;
pub use image_id::{ImageId, MAX_IMAGE_ID_LEN};
pub use resolution::{Dimensions, Resolution};
