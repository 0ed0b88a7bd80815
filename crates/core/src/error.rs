//! Error types for rail analytics
//!
//! Every fallible operation in the workspace returns [`RailResult`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors fall into three groups:
//! - staleness (`Format`, `VersionMismatch`): recovered by a rebuild
//! - contention (`LockContention`): only surfaced under the fail-fast lock policy
//! - corruption and resource errors (`UnknownTermId`, `CapacityOverflow`):
//!   fatal for the current operation, never degraded to a partial result

use std::io;
use std::path::PathBuf;

use crate::types::{DocId, Generation, TermId};
use thiserror::Error;

/// Result type alias for rail operations
pub type RailResult<T> = std::result::Result<T, RailError>;

/// Error types for rail building, loading and scanning
#[derive(Debug, Error)]
pub enum RailError {
    /// Rail file header is inconsistent with the file size
    #[error("rail format error in {path}: {reason}")]
    Format {
        /// Offending file
        path: PathBuf,
        /// What did not add up
        reason: String,
    },

    /// Rail file was built from another index generation
    #[error("rail generation mismatch: stored {stored}, live {live}")]
    VersionMismatch {
        /// Generation stamped in the file header
        stored: Generation,
        /// Generation of the live index
        live: Generation,
    },

    /// Another builder holds the exclusive lock
    #[error("rail build already in progress for {path}")]
    LockContention {
        /// Lock file path
        path: PathBuf,
    },

    /// A rail value falls outside the dictionary
    #[error(
        "unknown term id {term_id} at doc {doc_id} position {position} (dictionary size {dictionary_size})"
    )]
    UnknownTermId {
        /// The value read back from the rail
        term_id: TermId,
        /// Size of the dictionary the scan runs against
        dictionary_size: usize,
        /// Document being scanned
        doc_id: DocId,
        /// Position inside the document
        position: u32,
    },

    /// Requested buffer exceeds addressable size
    #[error("capacity overflow: cannot allocate {requested} elements")]
    CapacityOverflow {
        /// Requested element count
        requested: u64,
    },

    /// Field is missing or carries no positions
    #[error("field '{field}' cannot back a rail: {reason}")]
    FieldNotIndexed {
        /// Field name
        field: String,
        /// Why the field is unusable
        reason: String,
    },

    /// Caller supplied arguments that cannot be honored
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Scan was cancelled through its token
    #[error("scan cancelled")]
    Cancelled,

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (file operations, mapping, locking)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RailError {
    /// Construct a format error for `path`.
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RailError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Construct an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        RailError::InvalidInput(msg.into())
    }

    /// True when the on-disk rail must be rebuilt rather than reported.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            RailError::Format { .. } | RailError::VersionMismatch { .. }
        )
    }

    /// True for data corruption and allocation failures.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RailError::UnknownTermId { .. } | RailError::CapacityOverflow { .. }
        )
    }
}

/// Allocate a zeroed dense vector, mapping allocation failure to
/// [`RailError::CapacityOverflow`].
pub fn try_zeroed<T: Copy + Default>(len: usize) -> RailResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RailError::CapacityOverflow {
            requested: len as u64,
        })?;
    v.resize(len, T::default());
    Ok(v)
}
