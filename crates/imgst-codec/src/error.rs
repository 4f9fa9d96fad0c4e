/// Errors from the image codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The bytes could not be decoded as an image.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The resized image could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The image or the resize target has a zero side.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
