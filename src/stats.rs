//! Prune statistics.
//!
//! Counts and bytes are tallied while accounting, reconciling, and planning
//! run, then `finalize` derives the cross totals. The structs serialize to
//! the machine-readable summary record; human rendering lives in
//! [`crate::report`].
//!
//! # Invariants (after `finalize`)
//! - `blobs.total = used + unused + duplicate`.
//! - `bytes.total = used + duplicate + unused + unreferenced`, with
//!   `bytes.unused` widened to include duplicate bytes afterwards.
//! - `*.remove_total = remove + repack_rm (+ unreferenced for bytes and
//!   packs)` and `remain = total - remove_total`.

use serde::Serialize;

/// Blob counts in each lifecycle bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlobStats {
    /// Live blobs (first copy of each used handle).
    pub used: u64,
    /// Additional copies of live blobs.
    pub duplicate: u64,
    /// Blobs no snapshot references.
    pub unused: u64,
    /// All indexed blob copies.
    pub total: u64,
    /// Blobs inside packs selected for rewriting.
    pub repack: u64,
    /// Blobs the rewrite drops.
    #[serde(rename = "repack_remove")]
    pub repack_rm: u64,
    /// Blobs inside packs deleted outright.
    pub remove: u64,
    /// Blobs removed by any path.
    pub remove_total: u64,
    /// Blobs left after pruning.
    #[serde(rename = "remaining")]
    pub remain: u64,
}

/// Byte counts mirroring [`BlobStats`], plus unreferenced pack bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ByteStats {
    /// Bytes of live blobs, including pack headers.
    pub used: u64,
    /// Bytes of duplicate copies.
    pub duplicate: u64,
    /// Bytes of unused blobs. Widened by `finalize` to include duplicates.
    pub unused: u64,
    /// On-disk bytes of packs the index does not reference.
    #[serde(rename = "unreferenced")]
    pub unreferenced: u64,
    /// All accounted bytes.
    pub total: u64,
    /// Bytes read and rewritten by repacking.
    pub repack: u64,
    /// Bytes freed during the rewrite.
    #[serde(rename = "repack_remove")]
    pub repack_rm: u64,
    /// Bytes freed by deleting dead packs.
    pub remove: u64,
    /// Bytes freed by any path.
    pub remove_total: u64,
    /// Bytes left after pruning.
    #[serde(rename = "remaining")]
    pub remain: u64,
    /// Unused bytes left after pruning.
    #[serde(rename = "remaining_unused")]
    pub remain_unused: u64,
}

/// Pack-file counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PackStats {
    /// Packs whose blobs are all live.
    pub used: u64,
    /// Packs with no live content.
    pub unused: u64,
    /// Packs mixing live and dead blobs.
    pub partly_used: u64,
    /// On-disk packs unknown to the index.
    #[serde(rename = "unreferenced")]
    pub unreferenced: u64,
    /// All packs seen on disk.
    pub total: u64,
    /// Packs left untouched.
    pub keep: u64,
    /// Packs selected for rewriting.
    pub repack: u64,
    /// Packs deleted outright.
    pub remove: u64,
    /// Packs deleted by any path.
    pub remove_total: u64,
}

/// Full prune summary in three groupings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    /// Blob counts.
    pub blobs: BlobStats,
    /// Byte counts.
    pub bytes: ByteStats,
    /// Pack counts.
    #[serde(rename = "packfiles")]
    pub packs: PackStats,
}

impl PruneStats {
    /// Derives cross totals once planning has finished.
    ///
    /// Pack-set sizes (`packs.unreferenced`, `packs.repack`,
    /// `packs.remove`) must already be recorded.
    pub fn finalize(&mut self) {
        self.blobs.total = self.blobs.used + self.blobs.unused + self.blobs.duplicate;
        self.blobs.remove_total = self.blobs.remove + self.blobs.repack_rm;
        self.blobs.remain = self.blobs.total - self.blobs.remove_total;

        self.bytes.total =
            self.bytes.used + self.bytes.duplicate + self.bytes.unused + self.bytes.unreferenced;
        // Duplicate copies count as unused space from here on: exactly one
        // copy of each handle is live in the post-prune repository.
        self.bytes.unused += self.bytes.duplicate;
        self.bytes.remove_total = self.bytes.remove + self.bytes.repack_rm + self.bytes.unreferenced;
        self.bytes.remain = self.bytes.total - self.bytes.remove_total;
        self.bytes.remain_unused = self.bytes.unused - self.bytes.remove - self.bytes.repack_rm;

        self.packs.total =
            self.packs.used + self.packs.partly_used + self.packs.unused + self.packs.unreferenced;
        self.packs.remove_total = self.packs.unreferenced + self.packs.remove;
    }
}
