use std::path::Path;

use imgst_types::Dimensions;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Largest number of slots a store may be created with.
pub const MAX_CAPACITY: u32 = 100_000;
/// Largest side, in pixels, of the thumbnail box.
pub const MAX_THUMB_SIDE: u16 = 128;
/// Largest side, in pixels, of the small box.
pub const MAX_SMALL_SIDE: u16 = 512;

/// Parameters fixed when a store file is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of slots in the table.
    pub capacity: u32,
    /// Box the thumbnail resolution is shrunk to fit.
    pub thumb: Dimensions,
    /// Box the small resolution is shrunk to fit.
    pub small: Dimensions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            thumb: Dimensions::square(64),
            small: Dimensions::square(256),
        }
    }
}

impl StoreConfig {
    /// Check every field against the format limits.
    pub fn validate(&self) -> StoreResult<()> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(StoreError::InvalidArgument(format!(
                "capacity {} outside 1..={MAX_CAPACITY}",
                self.capacity
            )));
        }
        if !self.thumb.fits_within(MAX_THUMB_SIDE) {
            return Err(StoreError::InvalidArgument(format!(
                "thumbnail box {} outside 1..={MAX_THUMB_SIDE}",
                self.thumb
            )));
        }
        if !self.small.fits_within(MAX_SMALL_SIDE) {
            return Err(StoreError::InvalidArgument(format!(
                "small box {} outside 1..={MAX_SMALL_SIDE}",
                self.small
            )));
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| StoreError::InvalidArgument(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file(path: &Path) -> StoreResult<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

/// How a store file is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only. Mutations and cache fills fail with `InvalidArgument`.
    ReadOnly,
    #[default]
    ReadWrite,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}
