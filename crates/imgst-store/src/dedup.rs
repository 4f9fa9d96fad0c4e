//! Insert-time content deduplication.

use crate::error::{StoreError, StoreResult};
use crate::layout::{Slot, Variant};
use imgst_types::Resolution;

/// What [`dedup_candidate`] decided about a candidate's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupOutcome {
    /// No live slot holds this content. The caller must append the bytes
    /// and record the original variant.
    NewContent,
    /// The content already lives in the file; the candidate now shares the
    /// variant descriptors of slot `source`.
    Shared { source: usize },
}

/// Check `candidate`, destined for table position `index`, against every
/// other live slot.
///
/// - A live slot with the same identifier aborts with `DuplicateIdentifier`
///   and leaves `candidate` untouched.
/// - Every live slot with the same content hash has its full descriptor
///   array copied into `candidate`. The scan runs in ascending index and
///   does not stop early, so when several live slots share the hash the
///   descriptors of the last one win.
/// - With no hash match the original descriptor is reset to absent, which
///   tells the caller to append.
pub fn dedup_candidate(slots: &[Slot], index: usize, candidate: &mut Slot) -> StoreResult<DedupOutcome> {
    let mut shared: Option<(usize, [Variant; Resolution::COUNT])> = None;

    for (j, other) in slots.iter().enumerate() {
        if j == index || !other.is_live() {
            continue;
        }
        if other.id == candidate.id {
            return Err(StoreError::DuplicateIdentifier(candidate.id.clone()));
        }
        if other.hash == candidate.hash {
            shared = Some((j, other.variants));
        }
    }

    match shared {
        Some((source, variants)) => {
            candidate.variants = variants;
            Ok(DedupOutcome::Shared { source })
        }
        None => {
            *candidate.variant_mut(Resolution::Original) = Variant::ABSENT;
            Ok(DedupOutcome::NewContent)
        }
    }
}
