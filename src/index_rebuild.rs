//! Index persistence seam.
//!
//! After repacking, the index must be rewritten so it stops referencing
//! obsolete packs. The persistence layer writes a fresh set of index files
//! and reports which old index files they supersede; the executor then
//! deletes those.
//!
//! # Contract
//! - `rebuild` writes a complete index that excludes every pack in
//!   `obsolete_packs`.
//! - The returned ids are index files made obsolete by the write; they are
//!   safe to delete once `rebuild` has returned.
//! - `extra_obsolete` index ids are folded into the returned set even when
//!   the write itself did not supersede them.

use std::fmt;

use crate::id::{Id, PackIdSet};

/// Fatal index-write failure.
#[derive(Debug)]
pub struct IndexRebuildError {
    detail: String,
}

impl IndexRebuildError {
    /// Creates an error with a human-readable reason.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for IndexRebuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rebuilding index failed: {}", self.detail)
    }
}

impl std::error::Error for IndexRebuildError {}

/// Writes fresh index files excluding obsolete packs.
pub trait IndexRebuilder {
    /// Persists a new index without the given packs and returns the ids of
    /// superseded index files.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the prune run; the old index stays
    /// authoritative.
    fn rebuild(
        &mut self,
        obsolete_packs: &PackIdSet,
        extra_obsolete: &[Id],
    ) -> Result<Vec<Id>, IndexRebuildError>;
}

/// One recorded `rebuild` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildCall {
    /// Sorted pack ids excluded from the new index.
    pub excluded: Vec<Id>,
    /// Extra obsolete index ids passed through.
    pub extra: Vec<Id>,
}

/// Recording rebuilder for tests.
///
/// Returns the configured obsolete index ids from every call.
#[derive(Debug, Default)]
pub struct RecordingIndexRebuilder {
    /// Index ids to report as superseded.
    pub obsolete: Vec<Id>,
    /// Calls in invocation order.
    pub calls: Vec<RebuildCall>,
}

impl RecordingIndexRebuilder {
    /// Creates a rebuilder that reports the given superseded index files.
    #[must_use]
    pub fn with_obsolete(obsolete: Vec<Id>) -> Self {
        Self {
            obsolete,
            calls: Vec::new(),
        }
    }
}

impl IndexRebuilder for RecordingIndexRebuilder {
    fn rebuild(
        &mut self,
        obsolete_packs: &PackIdSet,
        extra_obsolete: &[Id],
    ) -> Result<Vec<Id>, IndexRebuildError> {
        let mut excluded: Vec<Id> = obsolete_packs.iter().copied().collect();
        excluded.sort_unstable();
        self.calls.push(RebuildCall {
            excluded,
            extra: extra_obsolete.to_vec(),
        });
        Ok(self.obsolete.clone())
    }
}

/// Rebuilder that always fails.
#[derive(Debug)]
pub struct FailingIndexRebuilder {
    detail: String,
}

impl FailingIndexRebuilder {
    /// Creates a rebuilder failing with the given reason.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl IndexRebuilder for FailingIndexRebuilder {
    fn rebuild(
        &mut self,
        _obsolete_packs: &PackIdSet,
        _extra_obsolete: &[Id],
    ) -> Result<Vec<Id>, IndexRebuildError> {
        Err(IndexRebuildError::new(self.detail.clone()))
    }
}
