//! Repository backend surface used by prune.
//!
//! The core only needs two capabilities from the object store: list pack
//! files with their on-disk sizes, and delete files by type and id. Pack
//! reads and writes belong to the rewriter collaborator.
//!
//! # Contract
//! - `list_packs` returns every pack file currently stored; no ordering is
//!   guaranteed (the planner sorts).
//! - `delete` removes exactly one file and fails if it does not exist.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;

use crate::id::Id;

/// Repository file kinds touched by prune.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Pack files holding blobs.
    Pack,
    /// Index files describing pack contents.
    Index,
}

impl FileType {
    /// Lowercase name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pack => "pack",
            Self::Index => "index",
        }
    }
}

/// One pack file as listed by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackFileInfo {
    /// Pack id.
    pub id: Id,
    /// On-disk size in bytes.
    pub size: u64,
}

/// Errors from backend operations.
#[derive(Debug)]
#[non_exhaustive]
pub enum BackendError {
    /// Listing the repository failed.
    List(io::Error),
    /// Deleting a file failed.
    Delete {
        tpe: FileType,
        id: Id,
        source: io::Error,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(err) => write!(f, "listing pack files failed: {err}"),
            Self::Delete { tpe, id, source } => {
                write!(
                    f,
                    "deleting {} file {} failed: {source}",
                    tpe.name(),
                    id.short_hex()
                )
            }
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::List(err) => Some(err),
            Self::Delete { source, .. } => Some(source),
        }
    }
}

/// Object-store access needed by prune.
pub trait Backend {
    /// Lists all pack files with their on-disk sizes.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::List` when the listing cannot be completed.
    fn list_packs(&self) -> Result<Vec<PackFileInfo>, BackendError>;

    /// Deletes one file.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Delete` when the file is absent or removal
    /// fails.
    fn delete(&mut self, tpe: FileType, id: Id) -> Result<(), BackendError>;
}

/// In-memory backend for tests.
///
/// Files live in sorted maps so listings are deterministic, and every
/// deletion is recorded in order for assertions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    packs: BTreeMap<Id, u64>,
    indexes: BTreeSet<Id>,
    /// Deletions in the order they were issued.
    pub deleted: Vec<(FileType, Id)>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pack file of the given size.
    pub fn add_pack(&mut self, id: Id, size: u64) {
        self.packs.insert(id, size);
    }

    /// Stores an index file.
    pub fn add_index(&mut self, id: Id) {
        self.indexes.insert(id);
    }

    /// Returns true while the pack file exists.
    #[must_use]
    pub fn contains_pack(&self, id: Id) -> bool {
        self.packs.contains_key(&id)
    }

    /// Returns true while the index file exists.
    #[must_use]
    pub fn contains_index(&self, id: Id) -> bool {
        self.indexes.contains(&id)
    }

    /// Number of stored pack files.
    #[must_use]
    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }
}

impl Backend for MemoryBackend {
    fn list_packs(&self) -> Result<Vec<PackFileInfo>, BackendError> {
        Ok(self
            .packs
            .iter()
            .map(|(&id, &size)| PackFileInfo { id, size })
            .collect())
    }

    fn delete(&mut self, tpe: FileType, id: Id) -> Result<(), BackendError> {
        let found = match tpe {
            FileType::Pack => self.packs.remove(&id).is_some(),
            FileType::Index => self.indexes.remove(&id),
        };
        if !found {
            return Err(BackendError::Delete {
                tpe,
                id,
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            });
        }
        self.deleted.push((tpe, id));
        Ok(())
    }
}
