//! Image codec boundary for ImgStore.
//!
//! The store never touches pixels itself. It hands original bytes to an
//! [`ImageCodec`] to learn their dimensions and to derive the cached
//! thumbnail and small resolutions.
//!
//! - [`ImageCodec`] -- decode / resize / encode contract
//! - [`JpegCodec`] -- the production implementation backed by `image`
//! - [`shrink_factor`] / [`scaled_dimensions`] -- the aspect-preserving,
//!   never-upscaling resize arithmetic shared by every codec

pub mod error;
pub mod jpeg;
pub mod traits;

pub use error::{CodecError, CodecResult};
pub use jpeg::JpegCodec;
pub use traits::{scaled_dimensions, shrink_factor, Decoded, ImageCodec};
