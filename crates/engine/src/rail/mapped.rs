//! Byte storage behind a loaded rail and typed views into it
//!
//! All offset arithmetic over the raw bytes stays in this module. Callers
//! only ever see [`RailSlice`], a bounds-checked view of one document's
//! term ids.

use std::fs::File;
use std::path::Path;

use railstat_core::{RailError, RailResult, TermId};

use super::format::{FIXED_HEADER_BYTES, SLOT_BYTES};

// ============================================================================
// RailData
// ============================================================================

/// Underlying storage for a loaded rail.
pub(crate) enum RailData {
    /// In-memory owned data
    Owned(Vec<u8>),
    /// Memory-mapped file data
    Mmap(memmap2::Mmap),
}

impl RailData {
    /// Map `path` read-only.
    ///
    /// Files shorter than the fixed header are reported as format errors
    /// without being mapped.
    pub(crate) fn map(path: &Path) -> RailResult<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len < FIXED_HEADER_BYTES as u64 {
            return Err(RailError::format(
                path,
                format!("file too small for header: {} bytes", len),
            ));
        }
        // SAFETY: rail files are only ever replaced by rename, never written
        // in place, so the mapped inode stays immutable while mapped.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Ok(RailData::Mmap(mmap))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            RailData::Owned(v) => v,
            RailData::Mmap(m) => m,
        }
    }

    pub(crate) fn is_mapped(&self) -> bool {
        matches!(self, RailData::Mmap(_))
    }
}

impl std::fmt::Debug for RailData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RailData::Owned(v) => write!(f, "Owned({} bytes)", v.len()),
            RailData::Mmap(m) => write!(f, "Mmap({} bytes)", m.len()),
        }
    }
}

// ============================================================================
// RailSlice
// ============================================================================

/// Read-only view of one document's rail.
#[derive(Clone, Copy)]
pub struct RailSlice<'a> {
    bytes: &'a [u8],
}

impl<'a> RailSlice<'a> {
    /// View over `bytes`, which must hold a whole number of slots.
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len() % SLOT_BYTES, 0);
        RailSlice { bytes }
    }

    /// Number of positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / SLOT_BYTES
    }

    /// True for documents without tokens in the field.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Term id at `position`, or `None` past the end.
    #[inline]
    pub fn get(&self, position: usize) -> Option<TermId> {
        let start = position.checked_mul(SLOT_BYTES)?;
        let end = start.checked_add(SLOT_BYTES)?;
        let slot = self.bytes.get(start..end)?;
        Some(decode(slot))
    }

    /// Iterate term ids in position order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = TermId> + 'a {
        self.bytes.chunks_exact(SLOT_BYTES).map(decode)
    }

    /// Copy the rail out.
    pub fn to_vec(&self) -> Vec<TermId> {
        self.iter().collect()
    }
}

impl std::fmt::Debug for RailSlice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[inline]
fn decode(slot: &[u8]) -> TermId {
    u32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]])
}
