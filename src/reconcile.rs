//! Reconciliation of the backend pack listing against index accounting.
//!
//! The index and the object store drift apart in both directions:
//! interrupted uploads leave packs the index never learned about, and
//! interrupted prunes leave index entries for packs that are gone. This
//! pass decides which discrepancies are tolerable and which must abort the
//! run.
//!
//! # Invariants
//! - Every on-disk pack ends up in exactly one of: `remove_first`
//!   (unreferenced), `present` (indexed, size-checked), or aborts the run.
//! - Indexed packs absent from the listing end up in `ignore` when they
//!   hold no live content; otherwise the run fails with `PacksMissing`.
//! - The listing is processed in sorted id order so stats and diagnostics
//!   are deterministic.

use ahash::AHashMap;

use crate::accounting::PackInfo;
use crate::backend::PackFileInfo;
use crate::errors::PlanError;
use crate::id::{Id, PackIdSet};
use crate::stats::PruneStats;

/// An indexed pack confirmed present on the backend.
#[derive(Clone, Copy, Debug)]
pub struct ReconciledPack {
    /// Pack id.
    pub id: Id,
    /// Accounting for the pack.
    pub info: PackInfo,
}

/// Result of reconciling listing and index.
#[derive(Debug)]
pub struct Reconciliation {
    /// On-disk packs the index does not reference; deleted before anything
    /// else because nothing can point at them.
    pub remove_first: PackIdSet,
    /// Stale index entries for missing packs with no live content; the
    /// index rebuild forgets them.
    pub ignore: PackIdSet,
    /// Indexed packs present on disk, in listing order.
    pub present: Vec<ReconciledPack>,
}

/// Cross-checks the backend listing against per-pack accounting.
///
/// Consumes `index_packs`; entries surviving neither in the listing nor as
/// tolerated stale entries abort the run.
///
/// # Errors
///
/// - `PlanError::SizeMismatch` when a pack with live content has an
///   on-disk size that disagrees with the index. The operator must rebuild
///   the index first.
/// - `PlanError::PacksMissing` when the index references packs with live
///   content that the backend does not have.
pub fn reconcile(
    mut listing: Vec<PackFileInfo>,
    mut index_packs: AHashMap<Id, PackInfo>,
    stats: &mut PruneStats,
) -> Result<Reconciliation, PlanError> {
    listing.sort_unstable_by_key(|file| file.id);

    let mut remove_first = PackIdSet::default();
    let mut present = Vec::with_capacity(listing.len());

    for file in listing {
        let Some(info) = index_packs.remove(&file.id) else {
            remove_first.insert(file.id);
            stats.bytes.unreferenced += file.size;
            continue;
        };

        // A size mismatch on a pack that still holds live content means the
        // index cannot be trusted for repacking. A fully dead pack is
        // deleted wholesale, so the mismatch is tolerated there.
        if info.accounted_size() != file.size && info.has_live_blobs() {
            return Err(PlanError::SizeMismatch {
                pack: file.id,
                computed: info.accounted_size(),
                actual: file.size,
            });
        }

        if !info.has_live_blobs() {
            stats.packs.unused += 1;
        } else if info.unused_blobs == 0 {
            stats.packs.used += 1;
        } else {
            stats.packs.partly_used += 1;
        }

        present.push(ReconciledPack { id: file.id, info });
    }

    // Whatever is left in the map is indexed but missing from the backend.
    let mut ignore = PackIdSet::default();
    let mut missing = Vec::new();
    for (id, info) in index_packs {
        if info.has_live_blobs() {
            missing.push(id);
        } else {
            // Stale entry for a dead pack: forget it during the index
            // rebuild and account its blobs as removed.
            stats.blobs.remove += u64::from(info.unused_blobs);
            stats.bytes.remove += info.unused_size;
            ignore.insert(id);
        }
    }

    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(PlanError::PacksMissing { packs: missing });
    }

    Ok(Reconciliation {
        remove_first,
        ignore,
        present,
    })
}
