//! Insert, delete, read, and list.
//!
//! Each mutation persists the affected slot before the header, so a crash
//! in between can leave `num_files` stale but never a half-written slot.

use imgst_codec::ImageCodec;
use imgst_types::{ImageId, Resolution};
use tracing::{debug, info};

use crate::dedup::{dedup_candidate, DedupOutcome};
use crate::error::{StoreError, StoreResult};
use crate::layout::{Header, Slot, Validity};
use crate::store::ImageStore;

/// One live image as reported by [`ImageStore::list`].
#[derive(Clone, Copy, Debug)]
pub struct ListedImage<'a> {
    pub index: usize,
    pub slot: &'a Slot,
}

impl<C: ImageCodec> ImageStore<C> {
    /// Insert `bytes` under `id` and return the slot index it landed in.
    ///
    /// Content already present under another identifier is not appended
    /// again; the new slot shares the existing variant descriptors.
    pub fn insert(&mut self, id: &str, bytes: &[u8]) -> StoreResult<usize> {
        self.file.ensure_writable()?;
        let id = ImageId::new(id)?;
        let header = self.file.header();
        if header.num_files >= header.capacity {
            return Err(StoreError::FullStore {
                capacity: header.capacity,
            });
        }
        let index = self.file.first_free_slot().ok_or_else(|| {
            StoreError::InvalidArgument("header counts free space but every slot is live".into())
        })?;
        let mut next = header.clone();
        next.version = next_version(header)?;
        next.num_files += 1;

        // The tombstone keeps its previous occupant's descriptors until reset.
        let mut candidate = self.file.slots()[index].clone();
        candidate.id = id.to_string();
        candidate.hash = self.hasher.hash(bytes);
        candidate.reset_variants();
        let outcome = dedup_candidate(self.file.slots(), index, &mut candidate)?;
        let (width, height) = self.codec.dimensions(bytes)?;

        if outcome == DedupOutcome::NewContent {
            *candidate.variant_mut(Resolution::Original) = self.file.append_blob(bytes)?;
        }
        candidate.orig_width = width;
        candidate.orig_height = height;
        candidate.validity = Validity::Live;
        self.file.replace_slot(index, candidate)?;
        self.file.replace_header(next)?;

        info!(id = %id, index, ?outcome, width, height, "inserted image");
        Ok(index)
    }

    /// Read the bytes of `id` at `resolution`, materializing the variant
    /// first if needed.
    pub fn read(&mut self, id: &str, resolution: Resolution) -> StoreResult<Vec<u8>> {
        let index = self.file.find_by_identifier(id)?;
        let variant = self.ensure_variant(index, resolution)?;
        self.file.read_blob(variant)
    }

    /// [`read`](Self::read) with the resolution given by name
    /// (`thumb`, `thumbnail`, `small`, `orig`, `original`).
    pub fn read_by_name(&mut self, id: &str, resolution: &str) -> StoreResult<Vec<u8>> {
        let resolution: Resolution = resolution.parse()?;
        self.read(id, resolution)
    }
}

impl<C> ImageStore<C> {
    /// Turn the live image `id` into a tombstone. Its bytes stay in the file
    /// until the store is compacted.
    pub fn delete(&mut self, id: &str) -> StoreResult<()> {
        if self.file.header().num_files == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let index = self.file.find_by_identifier(id)?;
        self.file.ensure_writable()?;
        let mut next = self.file.header().clone();
        next.version = next_version(&next)?;
        next.num_files -= 1;

        let mut slot = self.file.slots()[index].clone();
        slot.validity = Validity::Tombstone;
        self.file.replace_slot(index, slot)?;
        self.file.replace_header(next)?;

        debug!(id, index, "deleted image");
        Ok(())
    }

    /// Live images in table order. Call again to restart.
    pub fn list(&self) -> impl Iterator<Item = ListedImage<'_>> + '_ {
        self.file
            .live_slots()
            .map(|(index, slot)| ListedImage { index, slot })
    }

    /// `true` if a live image carries `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.file.find_by_identifier(id).is_ok()
    }
}

fn next_version(header: &Header) -> StoreResult<u32> {
    header
        .version
        .checked_add(1)
        .ok_or_else(|| StoreError::InvalidArgument("version counter exhausted".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenMode;
    use crate::test_support::{fake_image, fake_store, FakeCodec};
    use proptest::prelude::*;

    fn assert_counts_consistent<C>(store: &ImageStore<C>) {
        assert_eq!(store.len(), store.file().live_count());
    }

    #[test]
    fn insert_records_original_only() {
        let (_dir, mut store, _calls) = fake_store(10);
        let bytes = fake_image(1024, 768, 1);
        let index = store.insert("cat.jpg", &bytes).unwrap();

        let slot = store.file().slot(index).unwrap();
        assert!(slot.is_live());
        assert_eq!((slot.orig_width, slot.orig_height), (1024, 768));
        let orig = slot.variant(Resolution::Original);
        assert!(orig.offset > 0);
        assert_eq!(orig.size as usize, bytes.len());
        assert!(slot.variant(Resolution::Thumbnail).is_absent());
        assert!(slot.variant(Resolution::Small).is_absent());
        assert_eq!(store.len(), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn read_original_returns_inserted_bytes() {
        let (_dir, mut store, _calls) = fake_store(10);
        let bytes = fake_image(10, 10, 4);
        store.insert("a", &bytes).unwrap();
        assert_eq!(store.read("a", Resolution::Original).unwrap(), bytes);
    }

    #[test]
    fn duplicate_identifier_is_rejected_without_side_effects() {
        let (_dir, mut store, _calls) = fake_store(10);
        store.insert("a", &fake_image(10, 10, 1)).unwrap();
        let file_len = store.file().file_len().unwrap();

        let err = store.insert("a", &fake_image(20, 20, 2)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentifier(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.version(), 1);
        assert_eq!(store.file().file_len().unwrap(), file_len);
        assert_eq!(store.file().slot(1).unwrap(), &Slot::default());
    }

    #[test]
    fn identical_content_is_stored_once() {
        let (_dir, mut store, _calls) = fake_store(10);
        let bytes = fake_image(640, 480, 3);
        let a = store.insert("a", &bytes).unwrap();
        let blob_len = store.file().blob_len().unwrap();
        let b = store.insert("b", &bytes).unwrap();

        assert_eq!(store.file().blob_len().unwrap(), blob_len);
        let orig = |i| store.file().slot(i).unwrap().variant(Resolution::Original);
        assert_eq!(orig(a), orig(b));
    }

    #[test]
    fn shared_content_survives_deleting_one_owner() {
        let (_dir, mut store, _calls) = fake_store(10);
        let bytes = fake_image(640, 480, 3);
        store.insert("a", &bytes).unwrap();
        let thumb_a = store.read("a", Resolution::Thumbnail).unwrap();
        store.insert("b", &bytes).unwrap();

        let b = store.file().find_by_identifier("b").unwrap();
        let a = store.file().find_by_identifier("a").unwrap();
        assert_eq!(
            store.file().slot(a).unwrap().variant(Resolution::Thumbnail),
            store.file().slot(b).unwrap().variant(Resolution::Thumbnail)
        );

        store.delete("a").unwrap();
        assert_eq!(store.read("b", Resolution::Original).unwrap(), bytes);
        assert_eq!(store.read("b", Resolution::Thumbnail).unwrap(), thumb_a);
        assert!(!store.read("b", Resolution::Small).unwrap().is_empty());
    }

    #[test]
    fn thumbnail_read_is_idempotent() {
        let (_dir, mut store, calls) = fake_store(10);
        store.insert("a", &fake_image(500, 500, 9)).unwrap();

        let first = store.read("a", Resolution::Thumbnail).unwrap();
        let encodes = calls.encodes();
        assert_eq!(encodes, 1);
        let second = store.read("a", Resolution::Thumbnail).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.encodes(), encodes);
    }

    #[test]
    fn full_store_then_reuse_freed_slot() {
        let (_dir, mut store, _calls) = fake_store(10);
        for i in 0..10u8 {
            store.insert(&format!("img{i}"), &fake_image(100, 100, i)).unwrap();
        }
        let err = store.insert("img10", &fake_image(100, 100, 10)).unwrap_err();
        assert!(matches!(err, StoreError::FullStore { capacity: 10 }));
        assert_eq!(store.len(), 10);

        store.delete("img4").unwrap();
        let index = store.insert("img10", &fake_image(100, 100, 10)).unwrap();
        assert_eq!(index, 4);
        assert_eq!(store.len(), 10);
        assert_counts_consistent(&store);
    }

    #[test]
    fn reused_slot_starts_with_absent_variants() {
        let (_dir, mut store, _calls) = fake_store(2);
        store.insert("old", &fake_image(900, 900, 1)).unwrap();
        store.read("old", Resolution::Thumbnail).unwrap();
        store.read("old", Resolution::Small).unwrap();
        store.delete("old").unwrap();

        let index = store.insert("new", &fake_image(300, 200, 2)).unwrap();
        assert_eq!(index, 0);
        let slot = store.file().slot(index).unwrap();
        assert!(slot.variant(Resolution::Thumbnail).is_absent());
        assert!(slot.variant(Resolution::Small).is_absent());

        let thumb = store.read("new", Resolution::Thumbnail).unwrap();
        assert_eq!(FakeCodec::default().dimensions(&thumb).unwrap(), (64, 43));
    }

    #[test]
    fn delete_unknown_and_empty() {
        let (_dir, mut store, _calls) = fake_store(3);
        assert!(matches!(store.delete("ghost"), Err(StoreError::NotFound(_))));
        store.insert("a", &fake_image(10, 10, 1)).unwrap();
        assert!(matches!(store.delete("ghost"), Err(StoreError::NotFound(_))));
        store.delete("a").unwrap();
        assert!(matches!(store.delete("a"), Err(StoreError::NotFound(_))));
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn delete_keeps_content_bytes() {
        let (_dir, mut store, _calls) = fake_store(3);
        store.insert("a", &fake_image(10, 10, 1)).unwrap();
        let len = store.file().file_len().unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.file().file_len().unwrap(), len);
        assert!(matches!(store.read("a", Resolution::Original), Err(StoreError::NotFound(_))));
    }

    fn seed_version<C>(store: &mut ImageStore<C>, version: u32) {
        let mut header = store.header().clone();
        header.version = version;
        store.file.replace_header(header).unwrap();
    }

    #[test]
    fn exhausted_version_rejects_insert_before_writing() {
        let (_dir, mut store, _calls) = fake_store(3);
        seed_version(&mut store, u32::MAX);
        let len = store.file_len().unwrap();

        let err = store.insert("a", &fake_image(10, 10, 1)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert_eq!(store.version(), u32::MAX);
        assert!(store.is_empty());
        assert_eq!(store.file().live_count(), 0);
        assert_eq!(store.file_len().unwrap(), len);
    }

    #[test]
    fn exhausted_version_rejects_delete_before_writing() {
        let (dir, mut store, _calls) = fake_store(3);
        store.insert("a", &fake_image(10, 10, 1)).unwrap();
        seed_version(&mut store, u32::MAX);

        assert!(matches!(store.delete("a"), Err(StoreError::InvalidArgument(_))));
        store.close().unwrap();
        let store = ImageStore::open_with_codec(
            &dir.path().join("db.imgst"),
            OpenMode::ReadOnly,
            FakeCodec::default(),
        )
        .unwrap();
        assert!(store.contains("a"));
        assert_eq!(store.len(), store.file().live_count());
        assert_eq!(store.version(), u32::MAX);
    }

    #[test]
    fn read_by_name_validates_resolution() {
        let (_dir, mut store, _calls) = fake_store(3);
        store.insert("a", &fake_image(10, 10, 1)).unwrap();
        assert!(matches!(
            store.read_by_name("a", "huge"),
            Err(StoreError::InvalidResolution(_))
        ));
        assert!(store.read_by_name("a", "thumb").is_ok());
        assert!(matches!(store.read_by_name("b", "orig"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn invalid_identifiers_are_rejected() {
        let (_dir, mut store, _calls) = fake_store(3);
        assert!(matches!(
            store.insert("", &fake_image(10, 10, 1)),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(store.insert(&"x".repeat(128), &fake_image(10, 10, 1)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn undecodable_content_changes_nothing() {
        let (_dir, mut store, _calls) = fake_store(3);
        let len = store.file().file_len().unwrap();
        assert!(matches!(store.insert("a", b"garbage"), Err(StoreError::Codec(_))));
        assert_eq!(store.file().file_len().unwrap(), len);
        assert_eq!(store.version(), 0);
        assert!(!store.contains("a"));
    }

    #[test]
    fn list_is_restartable_and_ordered() {
        let (_dir, mut store, _calls) = fake_store(5);
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            store.insert(id, &fake_image(10, 10, i as u8)).unwrap();
        }
        store.delete("b").unwrap();
        let first: Vec<_> = store.list().map(|l| l.slot.id.clone()).collect();
        let second: Vec<_> = store.list().map(|l| l.index).collect();
        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(second, vec![0, 2]);
    }

    #[test]
    fn state_survives_reopen() {
        let (dir, mut store, _calls) = fake_store(5);
        store.insert("a", &fake_image(10, 10, 1)).unwrap();
        store.insert("b", &fake_image(10, 10, 2)).unwrap();
        store.delete("a").unwrap();
        store.close().unwrap();

        let mut store = ImageStore::open_with_codec(
            &dir.path().join("db.imgst"),
            OpenMode::ReadWrite,
            FakeCodec::default(),
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.version(), 3);
        assert!(store.contains("b"));
        assert_eq!(store.read("b", Resolution::Original).unwrap(), fake_image(10, 10, 2));
    }

    #[test]
    fn read_only_store_serves_materialized_variants_only() {
        let (dir, mut store, _calls) = fake_store(5);
        store.insert("a", &fake_image(400, 400, 1)).unwrap();
        store.read("a", Resolution::Small).unwrap();
        store.close().unwrap();

        let mut store = ImageStore::open_with_codec(
            &dir.path().join("db.imgst"),
            OpenMode::ReadOnly,
            FakeCodec::default(),
        )
        .unwrap();
        assert!(store.read("a", Resolution::Small).is_ok());
        assert!(matches!(
            store.read("a", Resolution::Thumbnail),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(store.delete("a"), Err(StoreError::InvalidArgument(_))));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(u8, u8),
        Delete(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8, 0u8..4).prop_map(|(id, seed)| Op::Insert(id, seed)),
            (0u8..8).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn num_files_tracks_live_slots(ops in proptest::collection::vec(op(), 1..40)) {
            let (_dir, mut store, _calls) = fake_store(5);
            for op in ops {
                let _ = match op {
                    Op::Insert(id, seed) => store
                        .insert(&format!("id{id}"), &fake_image(50, 40, seed))
                        .map(|_| ()),
                    Op::Delete(id) => store.delete(&format!("id{id}")),
                };
                prop_assert_eq!(store.len(), store.file().live_count());
                prop_assert!(store.len() <= store.capacity());
            }
        }
    }
}
