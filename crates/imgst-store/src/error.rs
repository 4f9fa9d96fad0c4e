use imgst_codec::CodecError;
use imgst_types::TypeError;

/// Errors from image store operations.
///
/// `Io` and `OutOfMemory` leave the handle in an unspecified state relative
/// to the file; the caller should close and reopen it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A caller-supplied value or an on-disk field is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No live image carries the requested identifier.
    #[error("image not found: {0}")]
    NotFound(String),

    /// A live image already carries the identifier being inserted.
    #[error("duplicate image id: {0}")]
    DuplicateIdentifier(String),

    /// Every slot of the store is live.
    #[error("store is full: all {capacity} slots are in use")]
    FullStore { capacity: u32 },

    /// The requested resolution is not one of thumbnail, small, or original.
    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    /// I/O error from the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A buffer sized from on-disk data could not be allocated.
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },

    /// The image codec rejected the content.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidResolution(name) => Self::InvalidResolution(name),
            other => Self::InvalidArgument(other.to_string()),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Allocate a zeroed buffer of `len` bytes, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_alloc_bytes(len: usize) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| StoreError::OutOfMemory { requested: len })?;
    buf.resize(len, 0);
    Ok(buf)
}
