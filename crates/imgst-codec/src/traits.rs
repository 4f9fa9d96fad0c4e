use imgst_types::Dimensions;

use crate::error::{CodecError, CodecResult};

/// A decoded image together with its pixel dimensions.
#[derive(Clone, Debug)]
pub struct Decoded<I> {
    pub width: u32,
    pub height: u32,
    pub image: I,
}

/// Decode, resize, and encode images.
///
/// Implementations must be deterministic for a given input: the store caches
/// the first encoding of each derived resolution and never recomputes it.
pub trait ImageCodec {
    /// In-memory pixel representation.
    type Image;

    /// Decode encoded bytes.
    fn decode(&self, bytes: &[u8]) -> CodecResult<Decoded<Self::Image>>;

    /// Scale an image by `factor` on both axes.
    ///
    /// Callers pass factors produced by [`shrink_factor`], which are always in
    /// `(0, 1]`.
    fn resize(&self, image: &Decoded<Self::Image>, factor: f64) -> CodecResult<Decoded<Self::Image>>;

    /// Encode an image back to bytes.
    fn encode(&self, image: &Decoded<Self::Image>) -> CodecResult<Vec<u8>>;

    /// Width and height of encoded bytes.
    fn dimensions(&self, bytes: &[u8]) -> CodecResult<(u32, u32)> {
        let decoded = self.decode(bytes)?;
        Ok((decoded.width, decoded.height))
    }
}

/// Scale factor that shrinks a `width x height` image to fit inside `target`
/// while preserving its aspect ratio. Never greater than 1.
pub fn shrink_factor(width: u32, height: u32, target: Dimensions) -> CodecResult<f64> {
    if width == 0 || height == 0 {
        return Err(CodecError::InvalidDimensions { width, height });
    }
    if target.is_degenerate() {
        return Err(CodecError::InvalidDimensions {
            width: u32::from(target.width),
            height: u32::from(target.height),
        });
    }
    let horizontal = f64::from(target.width) / f64::from(width);
    let vertical = f64::from(target.height) / f64::from(height);
    Ok(horizontal.min(vertical).min(1.0))
}

/// Pixel dimensions after scaling by `factor`, rounded and at least 1x1.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |side: u32| ((f64::from(side) * factor).round() as u32).max(1);
    (scale(width), scale(height))
}
