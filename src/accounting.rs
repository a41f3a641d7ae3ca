//! Blob classification and per-pack accounting.
//!
//! Planning starts with two passes over the index. The first pass splits
//! every indexed blob copy into used, duplicate, or unused and checks that
//! the live set is fully covered. The second pass attributes blob bytes to
//! their packs, seeding each pack with its header overhead.
//!
//! Two passes are intentional: the duplicate set must be complete before
//! any pack attribution, otherwise the first copy of a duplicate would be
//! counted as uniquely used in its pack.
//!
//! # Invariants
//! - After pass 1 the input `used` set is empty, or planning fails with
//!   `IndexIncomplete`.
//! - `used_size + unused_size` of a pack equals its on-disk size unless the
//!   pack has no live content (checked later by reconciliation).
//! - A duplicate blob's bytes count as used in every pack holding a copy;
//!   each copy is individually live until only one survives.

use ahash::AHashMap;

use crate::errors::PlanError;
use crate::id::{BlobHandleSet, BlobType, Id};
use crate::index::ReadIndex;
use crate::stats::PruneStats;

/// Dominant content type of a pack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PackType {
    /// No blob attributed yet.
    #[default]
    Unset,
    /// Only data blobs.
    Data,
    /// Only tree blobs.
    Tree,
    /// Blobs of more than one type.
    Mixed,
}

impl PackType {
    /// Folds one blob's type into the pack type.
    #[must_use]
    pub fn absorb(self, tpe: BlobType) -> Self {
        let observed = match tpe {
            BlobType::Data => Self::Data,
            BlobType::Tree => Self::Tree,
        };
        match self {
            Self::Unset => observed,
            _ if self == observed => self,
            _ => Self::Mixed,
        }
    }
}

/// Accounting result for one pack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackInfo {
    /// Live blobs that are the only copy of their handle.
    pub used_blobs: u32,
    /// Blobs no snapshot references.
    pub unused_blobs: u32,
    /// Copies of live blobs that also exist elsewhere.
    pub duplicate_blobs: u32,
    /// Bytes of live and duplicate blobs, plus the pack header.
    pub used_size: u64,
    /// Bytes of unused blobs.
    pub unused_size: u64,
    /// Dominant content type.
    pub tpe: PackType,
}

impl PackInfo {
    /// Seeds a pack with its header overhead.
    #[must_use]
    pub fn seeded(header_bytes: u32) -> Self {
        Self {
            used_size: u64::from(header_bytes),
            ..Self::default()
        }
    }

    /// True while the pack holds at least one live or duplicate blob and
    /// therefore must not be lost.
    #[inline]
    #[must_use]
    pub fn has_live_blobs(&self) -> bool {
        self.used_blobs > 0 || self.duplicate_blobs > 0
    }

    /// Size the index accounts for this pack.
    #[inline]
    #[must_use]
    pub fn accounted_size(&self) -> u64 {
        self.used_size + self.unused_size
    }
}

/// Output of the two accounting passes.
#[derive(Debug)]
pub struct Accounting {
    /// Live blob handles; the survivors of any rewrite.
    pub keep: BlobHandleSet,
    /// Per-pack accounting, keyed by pack id.
    pub packs: AHashMap<Id, PackInfo>,
}

/// Runs both accounting passes over the index.
///
/// Consumes `used`, the live set collected by the snapshot walker, and
/// tallies blob counts and bytes into `stats`.
///
/// # Errors
///
/// Returns `PlanError::IndexIncomplete` when live blobs are missing from
/// the index; pruning must not proceed because deleting packs would lose
/// referenced data.
pub fn account_index<I: ReadIndex + ?Sized>(
    index: &I,
    mut used: BlobHandleSet,
    stats: &mut PruneStats,
) -> Result<Accounting, PlanError> {
    let mut keep = BlobHandleSet::default();
    let mut duplicates = BlobHandleSet::default();

    // Pass 1: classify every indexed copy against the live set.
    index.each_blob(&mut |blob| {
        let size = u64::from(blob.length);
        if used.remove(&blob.handle) {
            keep.insert(blob.handle);
            stats.bytes.used += size;
            stats.blobs.used += 1;
        } else if keep.contains(&blob.handle) {
            duplicates.insert(blob.handle);
            stats.bytes.duplicate += size;
            stats.blobs.duplicate += 1;
        } else {
            stats.bytes.unused += size;
            stats.blobs.unused += 1;
        }
    });

    if !used.is_empty() {
        let mut missing: Vec<_> = used.into_iter().collect();
        missing.sort_unstable();
        return Err(PlanError::IndexIncomplete { missing });
    }

    // Pass 2: attribute blob bytes to packs. Header bytes are charged as
    // used space so the per-pack sums match on-disk sizes.
    let mut packs: AHashMap<Id, PackInfo> = AHashMap::new();
    index.each_pack_header(&mut |pack, header_bytes| {
        packs.insert(pack, PackInfo::seeded(header_bytes));
    });

    index.each_blob(&mut |blob| {
        let info = packs.entry(blob.pack).or_default();
        info.tpe = info.tpe.absorb(blob.handle.tpe);

        let size = u64::from(blob.length);
        if duplicates.contains(&blob.handle) {
            info.used_size += size;
            info.duplicate_blobs += 1;
        } else if keep.contains(&blob.handle) {
            info.used_size += size;
            info.used_blobs += 1;
        } else {
            info.unused_size += size;
            info.unused_blobs += 1;
        }
    });

    Ok(Accounting { keep, packs })
}
