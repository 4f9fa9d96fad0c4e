//! Compaction: rewrite a store without tombstones or orphaned bytes.
//!
//! The rewrite goes to a temporary file in the same directory and replaces
//! the original with a rename, so a failure at any step leaves the original
//! untouched.

use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use imgst_types::{ContentHash, Resolution};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::OpenMode;
use crate::error::{StoreError, StoreResult};
use crate::handle::StoreFile;
use crate::layout::{blob_region_start, Header, Slot, Variant};
use crate::store::ImageStore;

/// Outcome of a compaction pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactReport {
    pub live_images: usize,
    /// Payloads written to the new file.
    pub payloads_copied: usize,
    /// Materialized descriptors that reused an already copied payload.
    pub payloads_shared: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl CompactReport {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Where a payload lives in the source and where it lands in the output.
struct PayloadMove {
    from: Variant,
    to: Variant,
}

/// New table plus the copy list that fills its blob region.
struct Plan {
    slots: Vec<Slot>,
    copies: Vec<PayloadMove>,
    shared: usize,
    end: u64,
}

/// Lay out the compacted file: live slots packed to the front in table
/// order, each distinct `(hash, resolution)` payload stored once.
fn plan(source: &StoreFile) -> StoreResult<Plan> {
    let capacity = source.capacity();
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity).map_err(|_| StoreError::OutOfMemory {
        requested: capacity.saturating_mul(std::mem::size_of::<Slot>()),
    })?;

    let mut placed: HashMap<(ContentHash, Resolution), Variant> = HashMap::new();
    let mut copies = Vec::new();
    let mut shared = 0;
    let mut end = blob_region_start(source.header().capacity);

    for (_, slot) in source.live_slots() {
        let mut rewritten = slot.clone();
        for resolution in Resolution::ALL {
            let from = slot.variant(resolution);
            if from.is_absent() {
                continue;
            }
            let to = match placed.get(&(slot.hash, resolution)) {
                Some(&to) => {
                    shared += 1;
                    to
                }
                None => {
                    let to = Variant::new(end, from.size);
                    end += u64::from(from.size);
                    placed.insert((slot.hash, resolution), to);
                    copies.push(PayloadMove { from, to });
                    to
                }
            };
            *rewritten.variant_mut(resolution) = to;
        }
        slots.push(rewritten);
    }
    slots.resize(capacity, Slot::default());

    Ok(Plan {
        slots,
        copies,
        shared,
        end,
    })
}

/// Compact the store at `path` in place.
///
/// The header keeps its name, version, and target dimensions; `num_files`
/// is recomputed from the live slots.
pub fn compact(path: &Path) -> StoreResult<CompactReport> {
    let source = StoreFile::open(path, OpenMode::ReadOnly)?;
    let bytes_before = source.file_len()?;
    let plan = plan(&source)?;

    let live_images = plan.slots.iter().filter(|s| s.is_live()).count();
    let mut header: Header = source.header().clone();
    header.num_files = u32::try_from(live_images)
        .map_err(|_| StoreError::InvalidArgument(format!("{live_images} live images exceed capacity")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".imgst-compact")
        .tempfile_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        w.write_all(&header.encode()?)?;
        for slot in &plan.slots {
            w.write_all(&slot.encode()?)?;
        }
        for copy in &plan.copies {
            let bytes = source.read_blob(copy.from)?;
            debug!(
                from = copy.from.offset,
                to = copy.to.offset,
                size = copy.to.size,
                "copied payload"
            );
            w.write_all(&bytes)?;
        }
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    drop(source);

    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    let report = CompactReport {
        live_images,
        payloads_copied: plan.copies.len(),
        payloads_shared: plan.shared,
        bytes_before,
        bytes_after: plan.end,
    };
    info!(
        path = %path.display(),
        live = report.live_images,
        copied = report.payloads_copied,
        shared = report.payloads_shared,
        reclaimed = report.bytes_reclaimed(),
        "compacted image store"
    );
    Ok(report)
}

impl<C> ImageStore<C> {
    /// Compact this store's file and reload the table from the result.
    ///
    /// A read-only handle is rejected before anything happens and stays
    /// usable. If the rewrite fails the original file is untouched and so is
    /// this handle.
    pub fn compact(&mut self) -> StoreResult<CompactReport> {
        self.file.ensure_writable()?;
        self.file.sync()?;
        let path = self.file.path().to_path_buf();
        let report = compact(&path)?;
        self.file = StoreFile::open(&path, self.file.mode())?;
        Ok(report)
    }
}
