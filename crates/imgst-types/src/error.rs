use thiserror::Error;

/// Errors from parsing or validating ImgStore values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid resolution: {0:?}")]
    InvalidResolution(String),

    #[error("invalid image id: {0}")]
    InvalidImageId(String),
}
