//! Identifier types for blobs and repository files.
//!
//! Everything in the repository is content-addressed by a 32-byte digest.
//! `Id` is a fixed-size, zero-heap container for one digest; `BlobHandle`
//! pairs an `Id` with a `BlobType` because the repository may store the same
//! digest as both a data and a tree blob.
//!
//! # Ordering Semantics
//! - `Id` compares lexicographically on the digest bytes.
//! - `BlobHandle` compares by type first, then id, which gives diagnostic
//!   listings a stable, readable order.

use std::fmt;

use ahash::AHashSet;

/// Digest length in bytes.
pub const ID_LEN: usize = 32;

/// Hex characters rendered by [`Id::short_hex`] in messages and reports.
const SHORT_HEX_LEN: usize = 8;

/// A 32-byte content digest identifying a blob, pack file, or index file.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; ID_LEN]);

impl Id {
    /// Creates an id from raw digest bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the digest bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Parses a 64-character hex digest (either case).
    ///
    /// # Errors
    ///
    /// Returns `IdParseError` for wrong lengths or non-hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, IdParseError> {
        let hex = hex.as_bytes();
        if hex.len() != ID_LEN * 2 {
            return Err(IdParseError::InvalidLength { len: hex.len() });
        }
        let mut bytes = [0u8; ID_LEN];
        for (i, out) in bytes.iter_mut().enumerate() {
            let hi = hex_val(hex[2 * i]).ok_or(IdParseError::InvalidChar { at: 2 * i })?;
            let lo = hex_val(hex[2 * i + 1]).ok_or(IdParseError::InvalidChar { at: 2 * i + 1 })?;
            *out = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Short hex prefix for human-readable messages.
    #[must_use]
    pub fn short_hex(&self) -> String {
        let mut s = String::with_capacity(SHORT_HEX_LEN);
        for byte in &self.0[..SHORT_HEX_LEN / 2] {
            s.push(char::from(HEX_DIGITS[(byte >> 4) as usize]));
            s.push(char::from(HEX_DIGITS[(byte & 0x0f) as usize]));
        }
        s
    }
}

const HEX_DIGITS: [u8; 16] = *b"0123456789abcdef";

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lowercase hex, matching the repository's canonical rendering.
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

/// Errors from parsing hex digests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdParseError {
    /// Input is not exactly 64 hex characters.
    InvalidLength { len: usize },
    /// Input contains a non-hex character.
    InvalidChar { at: usize },
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { len } => {
                write!(f, "invalid digest length: {len} (expected {})", ID_LEN * 2)
            }
            Self::InvalidChar { at } => write!(f, "invalid hex character at offset {at}"),
        }
    }
}

impl std::error::Error for IdParseError {}

/// Blob content kind.
///
/// The discriminants are stable and may be used for compact serialization.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlobType {
    /// File content chunks.
    Data = 1,
    /// Serialized directory trees.
    Tree = 2,
}

impl BlobType {
    /// Lowercase name used in handle rendering.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Tree => "tree",
        }
    }
}

/// Unique blob identity: content type plus digest.
///
/// Two packs may both contain a copy of the same handle; such copies are
/// duplicates of one logical blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobHandle {
    /// Content kind.
    pub tpe: BlobType,
    /// Content digest.
    pub id: Id,
}

impl BlobHandle {
    /// Creates a handle.
    #[inline]
    #[must_use]
    pub const fn new(tpe: BlobType, id: Id) -> Self {
        Self { tpe, id }
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}/{}>", self.tpe.name(), self.id.short_hex())
    }
}

/// Set of blob handles keyed by digest bytes.
pub type BlobHandleSet = AHashSet<BlobHandle>;

/// Set of pack (or index) file ids.
pub type PackIdSet = AHashSet<Id>;
