use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{OpenMode, StoreConfig, MAX_CAPACITY};
use crate::error::{try_alloc_bytes, StoreError, StoreResult};
use crate::layout::{
    blob_region_start, slot_offset, Header, Slot, Variant, HEADER_SIZE, SLOT_SIZE,
};

/// An open store file: the backing file, its header, and the slot table.
///
/// The table is read in full on open and kept in memory; every mutation
/// rewrites exactly one fixed-size record in place. Dropping the handle
/// releases the file and the table.
pub struct StoreFile {
    path: PathBuf,
    file: File,
    mode: OpenMode,
    header: Header,
    slots: Vec<Slot>,
}

impl std::fmt::Debug for StoreFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("version", &self.header.version)
            .field("num_files", &self.header.num_files)
            .field("capacity", &self.header.capacity)
            .finish()
    }
}

impl StoreFile {
    /// Create (or truncate) `path` and write an empty store into it.
    pub fn create(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let header = Header::new(config.capacity, config.thumb, config.small);
        let capacity = config.capacity as usize;
        let mut slots = alloc_table(capacity)?;
        slots.resize(capacity, Slot::default());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        {
            let mut w = BufWriter::new(&file);
            w.write_all(&header.encode()?)?;
            let empty = Slot::default().encode()?;
            for _ in 0..capacity {
                w.write_all(&empty)?;
            }
            w.flush()?;
        }
        file.sync_all()?;

        info!(path = %path.display(), capacity, "created image store");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            mode: OpenMode::ReadWrite,
            header,
            slots,
        })
    }

    /// Open an existing store and load its slot table.
    pub fn open(path: &Path, mode: OpenMode) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(mode.is_writable())
            .open(path)?;

        let mut reader = BufReader::new(&file);
        let mut record = [0u8; HEADER_SIZE];
        reader.read_exact(&mut record)?;
        let header = Header::decode(&record)?;
        if header.capacity == 0 || header.capacity > MAX_CAPACITY {
            return Err(StoreError::InvalidArgument(format!(
                "header capacity {} outside 1..={MAX_CAPACITY}",
                header.capacity
            )));
        }

        let capacity = header.capacity as usize;
        let mut slots = alloc_table(capacity)?;
        let mut record = [0u8; SLOT_SIZE];
        for _ in 0..capacity {
            reader.read_exact(&mut record)?;
            slots.push(Slot::decode(&record)?);
        }
        drop(reader);

        let live = slots.iter().filter(|s| s.is_live()).count();
        if live != header.num_files as usize {
            warn!(
                path = %path.display(),
                num_files = header.num_files,
                live,
                "header image count disagrees with slot table"
            );
        }
        debug!(path = %path.display(), capacity, live, ?mode, "opened image store");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mode,
            header,
            slots,
        })
    }

    /// Flush file contents to disk without releasing the handle.
    pub fn sync(&self) -> StoreResult<()> {
        if self.mode.is_writable() {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Flush and release the file.
    pub fn close(self) -> StoreResult<()> {
        self.sync()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Total length of the backing file.
    pub fn file_len(&self) -> StoreResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Bytes currently held by the blob region.
    pub fn blob_len(&self) -> StoreResult<u64> {
        Ok(self.file_len()?.saturating_sub(self.blob_start()))
    }

    pub(crate) fn blob_start(&self) -> u64 {
        blob_region_start(self.header.capacity)
    }

    pub(crate) fn ensure_writable(&self) -> StoreResult<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(StoreError::InvalidArgument(format!(
                "{} is open read-only",
                self.path.display()
            )))
        }
    }

    /// Rewrite the header record from the in-memory header.
    pub fn persist_header(&mut self) -> StoreResult<()> {
        let bytes = self.header.encode()?;
        self.write_record(0, &bytes)
    }

    /// Rewrite slot record `index` from the in-memory table.
    pub fn persist_slot(&mut self, index: usize) -> StoreResult<()> {
        let bytes = self
            .slots
            .get(index)
            .ok_or_else(|| out_of_range(index, self.slots.len()))?
            .encode()?;
        self.write_record(slot_offset(index), &bytes)
    }

    /// Write `slot` to record `index`, then install it in the table.
    ///
    /// The table is untouched if the write fails.
    pub(crate) fn replace_slot(&mut self, index: usize, slot: Slot) -> StoreResult<()> {
        if index >= self.slots.len() {
            return Err(out_of_range(index, self.slots.len()));
        }
        let bytes = slot.encode()?;
        self.write_record(slot_offset(index), &bytes)?;
        self.slots[index] = slot;
        debug!(index, "persisted slot");
        Ok(())
    }

    /// Write `header` to the header record, then install it.
    pub(crate) fn replace_header(&mut self, header: Header) -> StoreResult<()> {
        let bytes = header.encode()?;
        self.write_record(0, &bytes)?;
        self.header = header;
        Ok(())
    }

    /// Read the bytes a materialized variant points at.
    pub fn read_blob(&self, variant: Variant) -> StoreResult<Vec<u8>> {
        if variant.offset < self.blob_start() {
            return Err(StoreError::InvalidArgument(format!(
                "offset {} lies outside the blob region",
                variant.offset
            )));
        }
        let mut buf = try_alloc_bytes(variant.size as usize)?;
        let mut file = &self.file;
        file.seek(SeekFrom::Start(variant.offset))?;
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Append `bytes` to the end of the blob region.
    pub(crate) fn append_blob(&mut self, bytes: &[u8]) -> StoreResult<Variant> {
        self.ensure_writable()?;
        let size = u32::try_from(bytes.len()).map_err(|_| {
            StoreError::InvalidArgument(format!("{} bytes exceeds the 4 GiB payload limit", bytes.len()))
        })?;
        let offset = self.file.seek(SeekFrom::End(0))?;
        if offset < self.blob_start() {
            return Err(StoreError::InvalidArgument(format!(
                "file ends at {offset}, before the blob region"
            )));
        }
        self.file.write_all(bytes)?;
        debug!(offset, size, "appended blob");
        Ok(Variant::new(offset, size))
    }

    fn write_record(&mut self, offset: u64, bytes: &[u8]) -> StoreResult<()> {
        self.ensure_writable()?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        Ok(())
    }
}

fn alloc_table(capacity: usize) -> StoreResult<Vec<Slot>> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity).map_err(|_| StoreError::OutOfMemory {
        requested: capacity.saturating_mul(std::mem::size_of::<Slot>()),
    })?;
    Ok(slots)
}

fn out_of_range(index: usize, capacity: usize) -> StoreError {
    StoreError::InvalidArgument(format!("slot index {index} outside 0..{capacity}"))
}
