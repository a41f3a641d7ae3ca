//! Error types for prune stages.
//!
//! Errors are stage-specific: planning errors mean no backend mutation has
//! happened yet and the operator can investigate safely; execution errors
//! halt at a step boundary whose intermediate state a retried prune
//! converges from. All enums are `#[non_exhaustive]` so variants can be
//! added without breaking callers.
//!
//! # Design Notes
//! - `IndexIncomplete`, `PacksMissing`, and `SizeMismatch` carry the ids
//!   needed for operator diagnostics; `Display` keeps messages short and
//!   points at `rebuild-index`.
//! - Collaborator failures keep their source errors for `source()` chains.

use std::fmt;

use crate::backend::BackendError;
use crate::id::{BlobHandle, Id};
use crate::index_rebuild::IndexRebuildError;
use crate::rewrite::RewriteError;

/// Errors from accounting, reconciliation, and planning.
///
/// None of these leave side effects in the repository; the plan is simply
/// not produced.
#[derive(Debug)]
#[non_exhaustive]
pub enum PlanError {
    /// Live blobs are not present in the index. Pruning would delete
    /// referenced data, so the run aborts before planning.
    IndexIncomplete {
        /// Sorted handles that the snapshot walker needs but the index
        /// does not know.
        missing: Vec<BlobHandle>,
    },
    /// A pack with live content whose on-disk size disagrees with index
    /// accounting.
    SizeMismatch {
        pack: Id,
        /// Size computed from index entries plus header.
        computed: u64,
        /// Size reported by the backend listing.
        actual: u64,
    },
    /// The index references packs with live content that the backend does
    /// not have.
    PacksMissing {
        /// Sorted ids of the missing packs.
        packs: Vec<Id>,
    },
    /// Backend listing failed.
    Backend(BackendError),
    /// Cancellation was requested.
    Cancelled,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexIncomplete { missing } => {
                write!(
                    f,
                    "index is not complete: {} live blobs not found; refusing to prune",
                    missing.len()
                )
            }
            Self::SizeMismatch {
                pack,
                computed,
                actual,
            } => {
                write!(
                    f,
                    "pack {}: calculated size {computed} does not match on-disk size {actual}; \
                     run rebuild-index",
                    pack.short_hex()
                )
            }
            Self::PacksMissing { packs } => {
                write!(
                    f,
                    "index references {} needed pack files missing from the repository",
                    packs.len()
                )
            }
            Self::Backend(err) => write!(f, "{err}"),
            Self::Cancelled => write!(f, "prune cancelled"),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for PlanError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

/// Errors from executing a prune plan.
///
/// Each variant corresponds to a step boundary with a documented recovery
/// state: rewrite failures leave originals and index untouched; rebuild
/// failures leave extra packs but a valid index; deletion failures leave
/// dead packs for the next run to sweep.
#[derive(Debug)]
#[non_exhaustive]
pub enum ExecuteError {
    /// The pack rewriter failed; the index was not touched.
    Rewrite(RewriteError),
    /// Writing the new index failed; the old index stays authoritative.
    IndexRebuild(IndexRebuildError),
    /// A backend deletion failed.
    Backend(BackendError),
    /// Cancellation was requested.
    Cancelled,
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rewrite(err) => write!(f, "{err}"),
            Self::IndexRebuild(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::Cancelled => write!(f, "prune cancelled"),
        }
    }
}

impl std::error::Error for ExecuteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rewrite(err) => Some(err),
            Self::IndexRebuild(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::Cancelled => None,
        }
    }
}

impl From<RewriteError> for ExecuteError {
    fn from(err: RewriteError) -> Self {
        Self::Rewrite(err)
    }
}

impl From<IndexRebuildError> for ExecuteError {
    fn from(err: IndexRebuildError) -> Self {
        Self::IndexRebuild(err)
    }
}

impl From<BackendError> for ExecuteError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

/// Umbrella error for a full prune run.
#[derive(Debug)]
#[non_exhaustive]
pub enum PruneError {
    /// Planning failed; the repository was not touched.
    Plan(PlanError),
    /// Execution failed at a step boundary.
    Execute(ExecuteError),
}

impl fmt::Display for PruneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan(err) => write!(f, "{err}"),
            Self::Execute(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PruneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Plan(err) => Some(err),
            Self::Execute(err) => Some(err),
        }
    }
}

impl From<PlanError> for PruneError {
    fn from(err: PlanError) -> Self {
        Self::Plan(err)
    }
}

impl From<ExecuteError> for PruneError {
    fn from(err: ExecuteError) -> Self {
        Self::Execute(err)
    }
}
