//! Plan execution.
//!
//! The four steps run strictly in order; each leaves the repository in a
//! state a retried prune converges from:
//!
//! 1. Delete unreferenced packs. The index never knew them, so nothing can
//!    break.
//! 2. Repack. On failure the originals and the index are untouched. On
//!    success the originals join the remove set.
//! 3. Rebuild the index excluding every obsoleted pack, then delete the
//!    superseded index files. On failure the old index still references
//!    the originals; the new packs are merely extra data.
//! 4. Delete the replaced packs. Only after the new index is live, so an
//!    interrupted run never leaves an index pointing at deleted packs.
//!
//! Dry-run returns before step 1 without touching the backend.

use crate::backend::{Backend, FileType};
use crate::cancel::CancelToken;
use crate::errors::ExecuteError;
use crate::id::{Id, PackIdSet};
use crate::index_rebuild::IndexRebuilder;
use crate::options::PruneOptions;
use crate::planner::PrunePlan;
use crate::rewrite::Rewriter;

/// Executes a prune plan against the backend.
///
/// # Errors
///
/// - `ExecuteError::Rewrite` / `ExecuteError::IndexRebuild` propagate
///   collaborator failures at their step boundary.
/// - `ExecuteError::Backend` for deletion failures.
/// - `ExecuteError::Cancelled` between steps and between deletions.
pub fn execute_plan<B, R, W>(
    opts: &PruneOptions,
    backend: &mut B,
    rewriter: &mut R,
    index_rebuilder: &mut W,
    mut plan: PrunePlan,
    cancel: &CancelToken,
) -> Result<(), ExecuteError>
where
    B: Backend + ?Sized,
    R: Rewriter + ?Sized,
    W: IndexRebuilder + ?Sized,
{
    if opts.dry_run {
        return Ok(());
    }

    // Step 1: unreferenced packs.
    delete_packs(backend, &plan.remove_first, cancel)?;

    // Step 2: rewrite.
    if !plan.repack.is_empty() {
        if cancel.is_cancelled() {
            return Err(ExecuteError::Cancelled);
        }
        rewriter.repack(&plan.repack, &plan.keep_blobs)?;
        let repacked = std::mem::take(&mut plan.repack);
        plan.remove.extend(repacked);
    }

    // Step 3: index rebuild. Skipped when no pack needs forgetting; the
    // existing index is already correct then.
    plan.ignore.extend(plan.remove.iter().copied());
    if !plan.ignore.is_empty() {
        if cancel.is_cancelled() {
            return Err(ExecuteError::Cancelled);
        }
        let obsolete_indexes = index_rebuilder.rebuild(&plan.ignore, &[])?;
        for id in obsolete_indexes {
            if cancel.is_cancelled() {
                return Err(ExecuteError::Cancelled);
            }
            backend.delete(FileType::Index, id)?;
        }
    }

    // Step 4: replaced packs.
    delete_packs(backend, &plan.remove, cancel)?;

    Ok(())
}

/// Deletes every pack in the set, in sorted order for determinism.
fn delete_packs<B: Backend + ?Sized>(
    backend: &mut B,
    packs: &PackIdSet,
    cancel: &CancelToken,
) -> Result<(), ExecuteError> {
    let mut ids: Vec<Id> = packs.iter().copied().collect();
    ids.sort_unstable();
    for id in ids {
        if cancel.is_cancelled() {
            return Err(ExecuteError::Cancelled);
        }
        backend.delete(FileType::Pack, id)?;
    }
    Ok(())
}
