use std::path::Path;

use imgst_codec::{ImageCodec, JpegCodec};
use imgst_crypto::ContentHasher;

use crate::config::{OpenMode, StoreConfig};
use crate::error::StoreResult;
use crate::handle::StoreFile;
use crate::layout::Header;

/// An image store: the store file plus the hash function and image codec
/// its operations call out to.
///
/// Single owner, single writer. Every operation runs to completion against
/// the file before returning.
pub struct ImageStore<C = JpegCodec> {
    pub(crate) file: StoreFile,
    pub(crate) hasher: ContentHasher,
    pub(crate) codec: C,
}

impl<C> std::fmt::Debug for ImageStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStore")
            .field("file", &self.file)
            .field("hasher", &self.hasher.domain())
            .finish()
    }
}

impl ImageStore<JpegCodec> {
    /// Create a store at `path` using the JPEG codec.
    pub fn create(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        Self::create_with_codec(path, config, JpegCodec::default())
    }

    /// Open the store at `path` using the JPEG codec.
    pub fn open(path: &Path, mode: OpenMode) -> StoreResult<Self> {
        Self::open_with_codec(path, mode, JpegCodec::default())
    }
}

impl<C: ImageCodec> ImageStore<C> {
    pub fn create_with_codec(path: &Path, config: &StoreConfig, codec: C) -> StoreResult<Self> {
        Ok(Self::from_parts(StoreFile::create(path, config)?, codec))
    }

    pub fn open_with_codec(path: &Path, mode: OpenMode, codec: C) -> StoreResult<Self> {
        Ok(Self::from_parts(StoreFile::open(path, mode)?, codec))
    }

    fn from_parts(file: StoreFile, codec: C) -> Self {
        Self {
            file,
            hasher: ContentHasher::IMAGE,
            codec,
        }
    }
}

impl<C> ImageStore<C> {
    /// Flush and release the file.
    pub fn close(self) -> StoreResult<()> {
        self.file.close()
    }

    /// The underlying file, header, and slot table.
    pub fn file(&self) -> &StoreFile {
        &self.file
    }

    pub fn header(&self) -> &Header {
        self.file.header()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Number of live images, as recorded in the header.
    pub fn len(&self) -> usize {
        self.file.header().num_files as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.file.capacity()
    }

    pub fn version(&self) -> u32 {
        self.file.header().version
    }

    /// Total size of the store file in bytes.
    pub fn file_len(&self) -> StoreResult<u64> {
        self.file.file_len()
    }

    /// Bytes held in the blob region, live or not.
    pub fn blob_len(&self) -> StoreResult<u64> {
        self.file.blob_len()
    }
}
