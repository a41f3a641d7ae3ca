//! Pack rewriter seam.
//!
//! Repacking reads each selected pack and copies the blobs whose handles
//! are in the keep set into freshly written packs; everything else is left
//! behind. The rewriter owns pack I/O, blob extraction, and the index
//! updates for the new packs.
//!
//! # Contract
//! - After a successful `repack`, every handle in `keep` that was stored in
//!   one of `packs` is readable from a new pack.
//! - On error nothing may be assumed about partially written packs, but the
//!   source packs and the index are untouched.

use std::fmt;

use crate::id::{BlobHandleSet, Id, PackIdSet};

/// Fatal rewriter failure.
#[derive(Debug)]
pub struct RewriteError {
    detail: String,
}

impl RewriteError {
    /// Creates an error with a human-readable reason.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repacking failed: {}", self.detail)
    }
}

impl std::error::Error for RewriteError {}

/// Rewrites packs, keeping only selected blobs.
pub trait Rewriter {
    /// Copies every blob of `packs` whose handle is in `keep` into new
    /// packs.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the prune run; the caller must not touch the
    /// index afterwards.
    fn repack(&mut self, packs: &PackIdSet, keep: &BlobHandleSet) -> Result<(), RewriteError>;
}

/// Rewriter that does nothing.
///
/// Useful when a test only exercises planning or deletion behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRewriter;

impl Rewriter for NoopRewriter {
    fn repack(&mut self, _packs: &PackIdSet, _keep: &BlobHandleSet) -> Result<(), RewriteError> {
        Ok(())
    }
}

/// One recorded `repack` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepackCall {
    /// Sorted pack ids passed to the rewriter.
    pub packs: Vec<Id>,
    /// Number of handles in the keep set at call time.
    pub keep_len: usize,
}

/// Rewriter that records its invocations for assertions.
#[derive(Debug, Default)]
pub struct RecordingRewriter {
    /// Calls in invocation order.
    pub calls: Vec<RepackCall>,
}

impl Rewriter for RecordingRewriter {
    fn repack(&mut self, packs: &PackIdSet, keep: &BlobHandleSet) -> Result<(), RewriteError> {
        let mut ids: Vec<Id> = packs.iter().copied().collect();
        ids.sort_unstable();
        self.calls.push(RepackCall {
            packs: ids,
            keep_len: keep.len(),
        });
        Ok(())
    }
}

/// Rewriter that always fails.
#[derive(Debug)]
pub struct FailingRewriter {
    detail: String,
}

impl FailingRewriter {
    /// Creates a rewriter failing with the given reason.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl Rewriter for FailingRewriter {
    fn repack(&mut self, _packs: &PackIdSet, _keep: &BlobHandleSet) -> Result<(), RewriteError> {
        Err(RewriteError::new(self.detail.clone()))
    }
}
