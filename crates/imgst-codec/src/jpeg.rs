use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageFormat};
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::traits::{scaled_dimensions, Decoded, ImageCodec};

/// JPEG codec backed by the `image` crate.
#[derive(Clone, Copy, Debug)]
pub struct JpegCodec {
    quality: u8,
    filter: FilterType,
}

impl JpegCodec {
    /// Default encoder quality for derived resolutions.
    pub const DEFAULT_QUALITY: u8 = 85;

    /// Create a codec encoding at the given quality (clamped to 1..=100).
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            ..Self::default()
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self {
            quality: Self::DEFAULT_QUALITY,
            filter: FilterType::Triangle,
        }
    }
}

impl ImageCodec for JpegCodec {
    type Image = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> CodecResult<Decoded<DynamicImage>> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok(Decoded {
            width: image.width(),
            height: image.height(),
            image,
        })
    }

    fn resize(
        &self,
        source: &Decoded<DynamicImage>,
        factor: f64,
    ) -> CodecResult<Decoded<DynamicImage>> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CodecError::InvalidDimensions {
                width: source.width,
                height: source.height,
            });
        }
        let (width, height) = scaled_dimensions(source.width, source.height, factor);
        debug!(
            from_w = source.width,
            from_h = source.height,
            to_w = width,
            to_h = height,
            "resizing image"
        );
        let image = if (width, height) == (source.width, source.height) {
            source.image.clone()
        } else {
            source.image.resize_exact(width, height, self.filter)
        };
        Ok(Decoded {
            width,
            height,
            image,
        })
    }

    fn encode(&self, source: &Decoded<DynamicImage>) -> CodecResult<Vec<u8>> {
        let rgb = source.image.to_rgb8();
        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }
}
