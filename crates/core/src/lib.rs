//! Core types and traits for rail analytics
//!
//! This crate defines the foundational types used throughout the system:
//! - TermId / DocId / Generation: identifiers and snapshot stamps
//! - RailError: Error type hierarchy
//! - TermDictionary, FieldPostings, IndexSnapshot: the view of the full-text index
//! - BitSet: document filters and per-document position masks
//! - SparseIntMap / PairKey: open-addressing counters for term pairs
//! - MemoryIndex: in-memory index snapshot for tests and embedding

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod bitset;
pub mod dictionary;
pub mod error;
pub mod index;
pub mod memory;
pub mod pair_key;
pub mod sparse_map;
pub mod tokenizer;
pub mod types;

// Re-export commonly used types and traits
pub use bitset::{BitSet, BitSetIter};
pub use dictionary::{DictionaryBuilder, FrozenDictionary, TermDictionary};
pub use error::{try_zeroed, RailError, RailResult};
pub use index::{FieldPostings, IndexSnapshot};
pub use memory::{FieldOptions, MemoryDocument, MemoryField, MemoryIndex, MemoryIndexBuilder};
pub use pair_key::PairKey;
pub use sparse_map::{SparseIntMap, DEFAULT_NO_VALUE};
pub use types::{DocId, Generation, TermId, HOLE_TERM_ID};
