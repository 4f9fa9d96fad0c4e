//! On-disk record layout.
//!
//! A store file is one header record, followed by `capacity` slot records,
//! followed by the append-only blob region:
//!
//! ```text
//! [header: 64 bytes]
//! [slot 0: 208 bytes] ... [slot capacity-1: 208 bytes]
//! [blob region: JPEG payloads addressed by slot descriptors]
//! ```
//!
//! Header record:
//!
//! ```text
//! [32 bytes: name, NUL terminated]
//! [4: version] [4: num_files] [4: capacity]
//! [2: thumb w] [2: thumb h] [2: small w] [2: small h]
//! [12: reserved, zero]
//! ```
//!
//! Slot record:
//!
//! ```text
//! [128 bytes: identifier, NUL terminated]
//! [32: content hash]
//! [4: original width] [4: original height]
//! [4 x 3: sizes, thumb/small/orig]
//! [8 x 3: offsets, thumb/small/orig]
//! [2: validity, 0 = tombstone, 1 = live]
//! [2: reserved, zero]
//! ```
//!
//! All integers are little-endian and records carry no alignment padding.
//! Because the header and the slot table always precede the blob region, a
//! blob offset of 0 never addresses content and marks an absent variant.

use std::fmt;

use imgst_types::{ContentHash, Dimensions, Resolution, MAX_IMAGE_ID_LEN};

use crate::error::{StoreError, StoreResult};

/// Bytes reserved for the store name, terminator included.
pub const NAME_FIELD_LEN: usize = 32;
/// Bytes reserved for an identifier, terminator included.
pub const ID_FIELD_LEN: usize = MAX_IMAGE_ID_LEN + 1;

/// Size of the header record.
pub const HEADER_SIZE: usize = NAME_FIELD_LEN + 4 * 3 + 2 * 4 + 12;
/// Size of one slot record.
pub const SLOT_SIZE: usize =
    ID_FIELD_LEN + ContentHash::LEN + 4 * 2 + 4 * Resolution::COUNT + 8 * Resolution::COUNT + 2 + 2;

/// Name written into the header of every new store.
pub const STORE_NAME: &str = "ImgStore binary";

/// Byte offset of slot `index`.
pub fn slot_offset(index: usize) -> u64 {
    HEADER_SIZE as u64 + index as u64 * SLOT_SIZE as u64
}

/// Byte offset of the first blob for a store of `capacity` slots.
pub fn blob_region_start(capacity: u32) -> u64 {
    slot_offset(capacity as usize)
}

/// Store-wide metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    /// Bumped by every insert and delete.
    pub version: u32,
    /// Number of live slots.
    pub num_files: u32,
    pub capacity: u32,
    pub thumb: Dimensions,
    pub small: Dimensions,
}

impl Header {
    pub fn new(capacity: u32, thumb: Dimensions, small: Dimensions) -> Self {
        Self {
            name: STORE_NAME.to_string(),
            version: 0,
            num_files: 0,
            capacity,
            thumb,
            small,
        }
    }

    /// Target box for a derived resolution. `None` for the original.
    pub fn target(&self, resolution: Resolution) -> Option<Dimensions> {
        match resolution {
            Resolution::Thumbnail => Some(self.thumb),
            Resolution::Small => Some(self.small),
            Resolution::Original => None,
        }
    }

    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        put_cstr(&mut buf, &self.name, NAME_FIELD_LEN, "store name")?;
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.num_files.to_le_bytes());
        buf.extend_from_slice(&self.capacity.to_le_bytes());
        for side in [self.thumb.width, self.thumb.height, self.small.width, self.small.height] {
            buf.extend_from_slice(&side.to_le_bytes());
        }
        buf.resize(HEADER_SIZE, 0);
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> StoreResult<Self> {
        let mut r = FieldReader::new(buf, HEADER_SIZE, "header")?;
        let name = r.cstr(NAME_FIELD_LEN)?;
        let version = r.u32();
        let num_files = r.u32();
        let capacity = r.u32();
        let thumb = Dimensions::new(r.u16(), r.u16());
        let small = Dimensions::new(r.u16(), r.u16());
        Ok(Self {
            name,
            version,
            num_files,
            capacity,
            thumb,
            small,
        })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*****************************************")?;
        writeln!(f, "**********IMGSTORE HEADER START**********")?;
        writeln!(f, "TYPE: {}", self.name)?;
        writeln!(f, "VERSION: {}", self.version)?;
        writeln!(f, "IMAGE COUNT: {}\t\tMAX IMAGES: {}", self.num_files, self.capacity)?;
        writeln!(f, "THUMBNAIL: {}\tSMALL: {}", self.thumb, self.small)?;
        writeln!(f, "***********IMGSTORE HEADER END***********")?;
        write!(f, "*****************************************")
    }
}

/// Location of one resolution's bytes in the blob region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Variant {
    pub offset: u64,
    pub size: u32,
}

impl Variant {
    /// Descriptor of a variant that has not been materialized.
    pub const ABSENT: Self = Self { offset: 0, size: 0 };

    pub fn new(offset: u64, size: u32) -> Self {
        Self { offset, size }
    }

    pub fn is_materialized(&self) -> bool {
        self.offset != 0
    }

    pub fn is_absent(&self) -> bool {
        self.offset == 0
    }
}

/// Whether a slot holds an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validity {
    #[default]
    Tombstone,
    Live,
}

impl Validity {
    fn code(self) -> u16 {
        match self {
            Self::Tombstone => 0,
            Self::Live => 1,
        }
    }

    fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Tombstone),
            1 => Some(Self::Live),
            _ => None,
        }
    }
}

/// One entry of the slot table.
///
/// A tombstone keeps whatever its previous occupant wrote; only live slots
/// are meaningful.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    pub id: String,
    pub hash: ContentHash,
    pub orig_width: u32,
    pub orig_height: u32,
    pub variants: [Variant; Resolution::COUNT],
    pub validity: Validity,
}

impl Slot {
    pub fn is_live(&self) -> bool {
        self.validity == Validity::Live
    }

    pub fn variant(&self, resolution: Resolution) -> Variant {
        self.variants[resolution.index()]
    }

    pub fn variant_mut(&mut self, resolution: Resolution) -> &mut Variant {
        &mut self.variants[resolution.index()]
    }

    /// Mark every resolution absent.
    pub fn reset_variants(&mut self) {
        self.variants = [Variant::ABSENT; Resolution::COUNT];
    }

    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(SLOT_SIZE);
        put_cstr(&mut buf, &self.id, ID_FIELD_LEN, "image id")?;
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(&self.orig_width.to_le_bytes());
        buf.extend_from_slice(&self.orig_height.to_le_bytes());
        for v in &self.variants {
            buf.extend_from_slice(&v.size.to_le_bytes());
        }
        for v in &self.variants {
            buf.extend_from_slice(&v.offset.to_le_bytes());
        }
        buf.extend_from_slice(&self.validity.code().to_le_bytes());
        buf.resize(SLOT_SIZE, 0);
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> StoreResult<Self> {
        let mut r = FieldReader::new(buf, SLOT_SIZE, "slot")?;
        let id = r.cstr(ID_FIELD_LEN)?;
        let hash = ContentHash::from_hash(r.array());
        let orig_width = r.u32();
        let orig_height = r.u32();
        let mut variants = [Variant::ABSENT; Resolution::COUNT];
        for v in variants.iter_mut() {
            v.size = r.u32();
        }
        for v in variants.iter_mut() {
            v.offset = r.u64();
        }
        let code = r.u16();
        let validity = Validity::from_code(code)
            .ok_or_else(|| StoreError::InvalidArgument(format!("invalid validity flag {code}")))?;
        Ok(Self {
            id,
            hash,
            orig_width,
            orig_height,
            variants,
            validity,
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let orig = self.variant(Resolution::Original);
        let thumb = self.variant(Resolution::Thumbnail);
        let small = self.variant(Resolution::Small);
        writeln!(f, "IMAGE ID: {}", self.id)?;
        writeln!(f, "SHA: {}", self.hash)?;
        writeln!(f, "VALID: {}", self.validity.code())?;
        writeln!(f, "OFFSET ORIG. : {}\t\tSIZE ORIG. : {}", orig.offset, orig.size)?;
        writeln!(f, "OFFSET THUMB.: {}\t\tSIZE THUMB.: {}", thumb.offset, thumb.size)?;
        writeln!(f, "OFFSET SMALL : {}\t\tSIZE SMALL : {}", small.offset, small.size)?;
        writeln!(f, "ORIGINAL: {} x {}", self.orig_width, self.orig_height)?;
        write!(f, "*****************************************")
    }
}

/// Write `s` into a fixed field of `len` bytes, NUL padded. At least one
/// terminator byte must remain.
fn put_cstr(buf: &mut Vec<u8>, s: &str, len: usize, what: &str) -> StoreResult<()> {
    let bytes = s.as_bytes();
    if bytes.len() >= len || bytes.contains(&0) {
        return Err(StoreError::InvalidArgument(format!(
            "{what} does not fit a {len}-byte field"
        )));
    }
    buf.extend_from_slice(bytes);
    buf.resize(buf.len() + (len - bytes.len()), 0);
    Ok(())
}

/// Sequential little-endian reader over a record of known size.
struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8], expected: usize, what: &str) -> StoreResult<Self> {
        if buf.len() != expected {
            return Err(StoreError::InvalidArgument(format!(
                "{what} record is {} bytes, expected {expected}",
                buf.len()
            )));
        }
        Ok(Self { buf, pos: 0 })
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N));
        out
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.array())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.array())
    }

    fn cstr(&mut self, len: usize) -> StoreResult<String> {
        let field = self.take(len);
        let end = field
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StoreError::InvalidArgument("string field is not NUL terminated".into()))?;
        String::from_utf8(field[..end].to_vec())
            .map_err(|_| StoreError::InvalidArgument("string field is not valid UTF-8".into()))
    }
}
