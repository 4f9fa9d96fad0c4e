//! Lazy materialization of derived resolutions.
//!
//! A variant is either absent (offset 0) or materialized. The first request
//! for an absent thumbnail or small variant decodes the original, shrinks it
//! to fit the header's box for that resolution, appends the encoding to the
//! blob region, and records it in the slot. A materialized variant is never
//! recomputed.

use imgst_codec::{shrink_factor, ImageCodec};
use imgst_types::Resolution;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::layout::Variant;
use crate::store::ImageStore;

impl<C: ImageCodec> ImageStore<C> {
    /// Make sure slot `index` has `resolution` materialized and return its
    /// descriptor.
    ///
    /// On any codec or I/O failure the descriptor stays absent.
    pub fn ensure_variant(&mut self, index: usize, resolution: Resolution) -> StoreResult<Variant> {
        if !self.file.is_live_index(index) {
            return Err(StoreError::InvalidArgument(format!(
                "slot {index} does not hold a live image"
            )));
        }
        let slot = &self.file.slots()[index];
        let current = slot.variant(resolution);
        if current.is_materialized() {
            return Ok(current);
        }
        let target = self.file.header().target(resolution).ok_or_else(|| {
            StoreError::InvalidArgument(format!("slot {index} has no original content"))
        })?;
        self.file.ensure_writable()?;

        let original = self.file.read_blob(slot.variant(Resolution::Original))?;
        let decoded = self.codec.decode(&original)?;
        let factor = shrink_factor(decoded.width, decoded.height, target)?;
        let resized = self.codec.resize(&decoded, factor)?;
        let encoded = self.codec.encode(&resized)?;

        let mut updated = slot.clone();
        let variant = self.file.append_blob(&encoded)?;
        *updated.variant_mut(resolution) = variant;
        self.file.replace_slot(index, updated)?;

        debug!(
            index,
            %resolution,
            width = resized.width,
            height = resized.height,
            offset = variant.offset,
            size = variant.size,
            "materialized variant"
        );
        Ok(variant)
    }
}
