//! Interfaces consumed from the surrounding full-text index
//!
//! The rail layer never writes postings, never tokenizes and never owns
//! documents. It sees a sealed index snapshot through these two traits:
//! - [`IndexSnapshot`]: document space, generation stamp, live docs, fields
//! - [`FieldPostings`]: dictionary and position lists of one text field
//!
//! Position lists include deleted documents, the way a segment keeps
//! postings until merge; callers filter with [`IndexSnapshot::live_docs`].

use std::path::Path;

use crate::bitset::BitSet;
use crate::dictionary::TermDictionary;
use crate::types::{DocId, Generation, TermId};

/// Postings of one indexed text field.
pub trait FieldPostings: Send + Sync {
    /// Frozen dictionary of the field.
    fn dictionary(&self) -> &dyn TermDictionary;

    /// Whether token positions were indexed for this field.
    fn has_positions(&self) -> bool;

    /// Token count of `doc`, when the index records it.
    ///
    /// `None` means unknown (the builder falls back to the highest position);
    /// documents without the field report `Some(0)` or `None`.
    fn token_count(&self, doc: DocId) -> Option<u32>;

    /// Append the ascending positions of `term` in `doc` to `out`.
    fn positions_of(&self, term: TermId, doc: DocId, out: &mut Vec<u32>);

    /// Visit every term occurring in `doc` with its ascending positions.
    fn visit_doc_terms(&self, doc: DocId, visitor: &mut dyn FnMut(TermId, &[u32]));

    /// Append the ascending ids of documents containing `term` to `out`.
    fn docs_with_term(&self, term: TermId, out: &mut Vec<DocId>);
}

/// A sealed, immutable snapshot of the index.
pub trait IndexSnapshot: Send + Sync {
    /// Size of the global document id space.
    fn doc_count(&self) -> u32;

    /// Stamp of this snapshot.
    fn generation(&self) -> Generation;

    /// Directory of the index; rail files live next to it by default.
    fn directory(&self) -> &Path;

    /// Live (non-deleted) documents; `None` when nothing is deleted.
    fn live_docs(&self) -> Option<&BitSet>;

    /// Postings of `name`, if the field exists.
    fn field(&self, name: &str) -> Option<&dyn FieldPostings>;

    /// Whether `doc` is live.
    fn is_live(&self, doc: DocId) -> bool {
        match self.live_docs() {
            Some(live) => live.contains(doc as usize),
            None => doc < self.doc_count(),
        }
    }
}
