//! Prune planning: which packs to delete, rewrite, or keep.
//!
//! Planning runs entirely in memory on the accounting and reconciliation
//! output. Wholly dead packs are deleted; clean packs are kept; everything
//! else becomes a repack candidate ranked by how much dead space a rewrite
//! reclaims per byte kept, subject to the operator's unused-space target
//! and repack-size cap.
//!
//! # Invariants
//! - Every blob in `keep_blobs` survives: its pack is either untouched or
//!   rewritten with the blob carried over.
//! - `bytes.repack` never exceeds the repack-size cap when one is set.
//! - Identical inputs produce identical plans; the candidate order ties
//!   break on pack id.

use crate::accounting::{account_index, PackInfo, PackType};
use crate::backend::Backend;
use crate::cancel::CancelToken;
use crate::errors::PlanError;
use crate::id::{BlobHandleSet, Id, PackIdSet};
use crate::index::ReadIndex;
use crate::options::PruneOptions;
use crate::reconcile::{reconcile, ReconciledPack, Reconciliation};
use crate::stats::PruneStats;

/// The decisions of one planning run.
#[derive(Debug, Default)]
pub struct PrunePlan {
    /// Unreferenced on-disk packs, deleted before anything else.
    pub remove_first: PackIdSet,
    /// Packs to rewrite, keeping only blobs in `keep_blobs`.
    pub repack: PackIdSet,
    /// Packs obsoleted outright; deleted after the index rebuild.
    pub remove: PackIdSet,
    /// Stale index entries to drop during the rebuild.
    pub ignore: PackIdSet,
    /// Live blob handles that must survive.
    pub keep_blobs: BlobHandleSet,
}

impl PrunePlan {
    /// True when executing the plan would not touch the backend.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove_first.is_empty()
            && self.repack.is_empty()
            && self.remove.is_empty()
            && self.ignore.is_empty()
    }
}

/// A pack that is neither removed outright nor clean enough to keep.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: Id,
    info: PackInfo,
}

/// Plans one prune run.
///
/// Consumes `used`, the live blob set from the snapshot walker. No backend
/// mutation happens here; the listing is the only I/O.
///
/// # Errors
///
/// Propagates accounting and reconciliation failures (`IndexIncomplete`,
/// `SizeMismatch`, `PacksMissing`), backend listing errors, and
/// cancellation.
pub fn plan_prune<I, B>(
    opts: &PruneOptions,
    index: &I,
    backend: &B,
    used: BlobHandleSet,
    cancel: &CancelToken,
) -> Result<(PrunePlan, PruneStats), PlanError>
where
    I: ReadIndex + ?Sized,
    B: Backend + ?Sized,
{
    let mut stats = PruneStats::default();

    if cancel.is_cancelled() {
        return Err(PlanError::Cancelled);
    }
    let accounting = account_index(index, used, &mut stats)?;

    if cancel.is_cancelled() {
        return Err(PlanError::Cancelled);
    }
    let listing = backend.list_packs()?;
    if cancel.is_cancelled() {
        return Err(PlanError::Cancelled);
    }

    let recon = reconcile(listing, accounting.packs, &mut stats)?;
    let plan = decide(opts, recon, accounting.keep, &mut stats);
    Ok((plan, stats))
}

/// Applies the decision table and the cost-bounded candidate selection.
fn decide(
    opts: &PruneOptions,
    recon: Reconciliation,
    keep_blobs: BlobHandleSet,
    stats: &mut PruneStats,
) -> PrunePlan {
    let mut remove = PackIdSet::default();
    let mut repack = PackIdSet::default();
    let mut candidates: Vec<Candidate> = Vec::new();

    // Cleared when any pack holding duplicate blobs is kept; while it stays
    // true the rewrite collapses every duplicate to a single copy.
    let mut repack_all_with_duplicates = true;

    for ReconciledPack { id, info } in recon.present {
        if !info.has_live_blobs() {
            remove.insert(id);
            stats.blobs.remove += u64::from(info.unused_blobs);
            stats.bytes.remove += info.unused_size;
        } else if opts.repack_cacheable_only && info.tpe == PackType::Data {
            keep_pack(&info, stats, &mut repack_all_with_duplicates);
        } else if info.unused_blobs == 0 && info.duplicate_blobs == 0 && info.tpe != PackType::Mixed
        {
            keep_pack(&info, stats, &mut repack_all_with_duplicates);
        } else {
            candidates.push(Candidate { id, info });
        }
    }

    sort_candidates(&mut candidates);

    let max_unused_after = opts.max_unused.limit_after_prune(stats.bytes.used);

    for candidate in candidates {
        let info = &candidate.info;

        let reached_unused_target =
            stats.bytes.unused - stats.bytes.remove - stats.bytes.repack_rm < max_unused_after;
        let over_repack_cap = opts.max_repack_size.is_some_and(|cap| {
            stats.bytes.repack + info.used_size + info.unused_size > cap
        });

        if over_repack_cap {
            // The operator cap is hard, whatever else the pack contains.
            keep_pack(info, stats, &mut repack_all_with_duplicates);
        } else if info.duplicate_blobs > 0 || info.tpe != PackType::Data {
            // Duplicates and tree/mixed packs are only gated by the cap.
            repack_pack(candidate.id, info, &mut repack, stats);
        } else if reached_unused_target {
            keep_pack(info, stats, &mut repack_all_with_duplicates);
        } else {
            repack_pack(candidate.id, info, &mut repack, stats);
        }
    }

    if repack_all_with_duplicates {
        // Every pack holding duplicates is rewritten, so each surviving
        // handle keeps exactly one copy.
        stats.blobs.repack_rm += stats.blobs.duplicate;
        stats.bytes.repack_rm += stats.bytes.duplicate;
    }

    stats.packs.unreferenced = recon.remove_first.len() as u64;
    stats.packs.repack = repack.len() as u64;
    stats.packs.remove = remove.len() as u64;
    stats.finalize();

    PrunePlan {
        remove_first: recon.remove_first,
        repack,
        remove,
        ignore: recon.ignore,
        keep_blobs,
    }
}

fn keep_pack(info: &PackInfo, stats: &mut PruneStats, repack_all_with_duplicates: &mut bool) {
    stats.packs.keep += 1;
    if info.duplicate_blobs > 0 {
        *repack_all_with_duplicates = false;
    }
}

fn repack_pack(id: Id, info: &PackInfo, repack: &mut PackIdSet, stats: &mut PruneStats) {
    repack.insert(id);
    stats.blobs.repack +=
        u64::from(info.used_blobs) + u64::from(info.unused_blobs) + u64::from(info.duplicate_blobs);
    stats.bytes.repack += info.used_size + info.unused_size;
    stats.blobs.repack_rm += u64::from(info.unused_blobs);
    stats.bytes.repack_rm += info.unused_size;
}

/// Orders candidates so the most profitable rewrites come first.
///
/// Packs holding duplicates precede all others, then tree/mixed packs
/// precede data packs, then higher unused/used ratio wins. The ratio
/// comparison cross-multiplies in 128 bits instead of dividing, so very
/// small and very large packs compare exactly. Pack id breaks ties to keep
/// planning deterministic.
fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_unstable_by(|a, b| {
        let pa = &a.info;
        let pb = &b.info;
        let duplicates = (pa.duplicate_blobs == 0).cmp(&(pb.duplicate_blobs == 0));
        let data_last = (pa.tpe == PackType::Data).cmp(&(pb.tpe == PackType::Data));
        let ratio_a = u128::from(pa.unused_size) * u128::from(pb.used_size);
        let ratio_b = u128::from(pb.unused_size) * u128::from(pa.used_size);
        duplicates
            .then(data_last)
            .then(ratio_b.cmp(&ratio_a))
            .then_with(|| a.id.cmp(&b.id))
    });
}
