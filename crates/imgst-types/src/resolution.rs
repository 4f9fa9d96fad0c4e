use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One of the three resolutions a store keeps per image.
///
/// The discriminant is the on-disk position of the variant inside a slot's
/// size and offset arrays, so the declaration order must not change.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Thumbnail = 0,
    Small = 1,
    #[default]
    Original = 2,
}

impl Resolution {
    /// All resolutions in on-disk order.
    pub const ALL: [Resolution; 3] = [Self::Thumbnail, Self::Small, Self::Original];

    /// Number of resolutions stored per slot.
    pub const COUNT: usize = 3;

    /// Position of this resolution in a slot's variant array.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Suffix appended to an image id when the variant is exported to a file.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Thumbnail => "_thumb",
            Self::Small => "_small",
            Self::Original => "_orig",
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Small => "small",
            Self::Original => "original",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resolution {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumb" | "thumbnail" => Ok(Self::Thumbnail),
            "small" => Ok(Self::Small),
            "orig" | "original" => Ok(Self::Original),
            other => Err(TypeError::InvalidResolution(other.to_string())),
        }
    }
}

/// Width/height box, in pixels, that a derived resolution is shrunk to fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// A square box.
    pub const fn square(side: u16) -> Self {
        Self::new(side, side)
    }

    /// Returns `true` if either side is zero.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if both sides are within `1..=max`.
    pub fn fits_within(&self, max: u16) -> bool {
        !self.is_degenerate() && self.width <= max && self.height <= max
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_historical_names() {
        assert_eq!("thumb".parse::<Resolution>().unwrap(), Resolution::Thumbnail);
        assert_eq!("thumbnail".parse::<Resolution>().unwrap(), Resolution::Thumbnail);
        assert_eq!("small".parse::<Resolution>().unwrap(), Resolution::Small);
        assert_eq!("orig".parse::<Resolution>().unwrap(), Resolution::Original);
        assert_eq!("original".parse::<Resolution>().unwrap(), Resolution::Original);
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "medium".parse::<Resolution>().unwrap_err();
        assert_eq!(err, TypeError::InvalidResolution("medium".into()));
        assert!("THUMB".parse::<Resolution>().is_err());
    }

    #[test]
    fn index_matches_disk_order() {
        assert_eq!(Resolution::Thumbnail.index(), 0);
        assert_eq!(Resolution::Small.index(), 1);
        assert_eq!(Resolution::Original.index(), 2);
        for (position, res) in Resolution::ALL.iter().enumerate() {
            assert_eq!(res.index(), position);
        }
    }

    #[test]
    fn default_is_original() {
        assert_eq!(Resolution::default(), Resolution::Original);
    }

    #[test]
    fn dimensions_bounds() {
        assert!(Dimensions::square(64).fits_within(128));
        assert!(!Dimensions::new(0, 64).fits_within(128));
        assert!(!Dimensions::new(64, 129).fits_within(128));
        assert_eq!(Dimensions::new(256, 192).to_string(), "256 x 192");
    }
}
