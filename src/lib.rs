//! Garbage-collection and compaction core for a content-addressed,
//! deduplicating backup repository.
//!
//! Blobs are stored inside append-only pack files and located through an
//! index; snapshots reference trees of blobs by digest. When snapshots are
//! forgotten, packs end up holding a mix of live and dead blobs. This crate
//! decides which packs to delete outright, which to rewrite keeping only
//! their live blobs, and which to leave alone, then executes that plan in
//! an order that keeps every intermediate state recoverable.
//!
//! Pipeline for one prune run:
//! 1. `accounting` classifies every indexed blob against the live set and
//!    aggregates per-pack usage (two passes, duplicates resolved first).
//! 2. `reconcile` cross-checks the backend pack listing against the index
//!    and sorts discrepancies into tolerable and fatal.
//! 3. `planner` turns the accounting into a [`PrunePlan`] under the
//!    operator's unused-space and repack-size limits.
//! 4. `executor` applies the plan: delete unreferenced packs, rewrite,
//!    rebuild the index, delete replaced packs.
//!
//! # Invariants
//! - Every blob referenced by a kept snapshot survives execution.
//! - No backend mutation before planning completes; `dry_run` never
//!   mutates at all.
//! - Planning is deterministic for identical inputs.
//!
//! The caller provides the live blob set (from the snapshot walker) and
//! the collaborator implementations; the whole run must hold an exclusive
//! repository lock.

pub mod accounting;
pub mod backend;
pub mod cancel;
pub mod errors;
pub mod executor;
pub mod id;
pub mod index;
pub mod index_rebuild;
pub mod options;
pub mod planner;
pub mod reconcile;
pub mod report;
pub mod rewrite;
pub mod stats;

pub use accounting::{account_index, Accounting, PackInfo, PackType};
pub use backend::{Backend, BackendError, FileType, MemoryBackend, PackFileInfo};
pub use cancel::CancelToken;
pub use errors::{ExecuteError, PlanError, PruneError};
pub use executor::execute_plan;
pub use id::{BlobHandle, BlobHandleSet, BlobType, Id, IdParseError, PackIdSet, ID_LEN};
pub use index::{InMemoryIndex, IndexedBlob, ReadIndex};
pub use index_rebuild::{
    FailingIndexRebuilder, IndexRebuildError, IndexRebuilder, RebuildCall, RecordingIndexRebuilder,
};
pub use options::{parse_size, MaxUnused, OptionsError, PruneOptions};
pub use planner::{plan_prune, PrunePlan};
pub use reconcile::{reconcile, ReconciledPack, Reconciliation};
pub use rewrite::{
    FailingRewriter, NoopRewriter, RecordingRewriter, RepackCall, RewriteError, Rewriter,
};
pub use stats::{BlobStats, ByteStats, PackStats, PruneStats};

/// Plans and executes one prune run.
///
/// Convenience composition of [`plan_prune`] and [`execute_plan`]; the
/// returned stats describe the plan whether or not `opts.dry_run` skipped
/// execution.
///
/// # Errors
///
/// Propagates planning failures (no backend side effects) and execution
/// failures (halted at a recoverable step boundary).
pub fn prune<I, B, R, W>(
    opts: &PruneOptions,
    index: &I,
    backend: &mut B,
    rewriter: &mut R,
    index_rebuilder: &mut W,
    used: BlobHandleSet,
    cancel: &CancelToken,
) -> Result<PruneStats, PruneError>
where
    I: ReadIndex + ?Sized,
    B: Backend + ?Sized,
    R: Rewriter + ?Sized,
    W: IndexRebuilder + ?Sized,
{
    let (plan, stats) = plan_prune(opts, index, backend, used, cancel)?;
    execute_plan(opts, backend, rewriter, index_rebuilder, plan, cancel)?;
    Ok(stats)
}
