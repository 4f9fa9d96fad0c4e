use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::resolution::Resolution;

/// Longest identifier, in bytes, that fits a slot record with its terminator.
pub const MAX_IMAGE_ID_LEN: usize = 127;

/// Identifier of one image inside a store.
///
/// Non-empty, at most [`MAX_IMAGE_ID_LEN`] bytes of UTF-8, and free of NUL
/// bytes so it survives the null-terminated on-disk encoding.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(String);

impl ImageId {
    /// Validate and wrap an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidImageId("empty identifier".into()));
        }
        if id.len() > MAX_IMAGE_ID_LEN {
            return Err(TypeError::InvalidImageId(format!(
                "{} bytes exceeds the {MAX_IMAGE_ID_LEN}-byte limit",
                id.len()
            )));
        }
        if id.as_bytes().contains(&0) {
            return Err(TypeError::InvalidImageId("contains a NUL byte".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name a variant is exported under: `<id><suffix>.jpg`.
    pub fn output_file_name(&self, resolution: Resolution) -> String {
        format!("{}{}.jpg", self.0, resolution.suffix())
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({:?})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ImageId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ImageId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
