//! Core types for rail analytics
//!
//! This module defines the foundational types:
//! - TermId: dense dictionary identifier of a term
//! - DocId: global document identifier
//! - Generation: opaque stamp of an immutable index snapshot

use std::fmt;

/// Dense term identifier, `0..dictionary.size()`.
pub type TermId = u32;

/// Global document identifier, `0..snapshot.doc_count()`.
pub type DocId = u32;

/// Term id reserved for positions that carry no token.
///
/// [`crate::DictionaryBuilder`] always assigns it to the empty term, so a
/// hole never aliases a real term.
pub const HOLE_TERM_ID: TermId = 0;

/// Stamp identifying one immutable snapshot of the underlying index.
///
/// Stored in the rail header as a 64-bit integer. Any difference between
/// the stored and the live stamp marks a rail as stale; ordering is only
/// used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Wrap a raw stamp.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw stamp value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The stamp that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<u64> for Generation {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}
