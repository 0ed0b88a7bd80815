//! In-memory index snapshot
//!
//! A small, complete implementation of [`IndexSnapshot`] used by tests,
//! benchmarks and embedders that do not have a disk index at hand.
//!
//! ```text
//! MemoryIndexBuilder ──add_document/delete──▶ commit() ──▶ MemoryIndex (immutable, gN)
//!          ▲                                                   │
//!          └────────────── keeps accumulating ◀────────────────┘
//! ```
//!
//! Every `commit` produces a new snapshot with the next [`Generation`].
//! Empty tokens are holes: they take a position but are never indexed.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::bitset::BitSet;
use crate::dictionary::{DictionaryBuilder, FrozenDictionary, TermDictionary};
use crate::index::{FieldPostings, IndexSnapshot};
use crate::tokenizer::tokenize;
use crate::types::{DocId, Generation, TermId, HOLE_TERM_ID};

/// What the index records for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    /// Index token positions.
    pub positions: bool,
    /// Record per-document token counts.
    pub token_counts: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        FieldOptions {
            positions: true,
            token_counts: true,
        }
    }
}

/// One document to add, as token streams per field.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    fields: Vec<(String, Vec<String>)>,
}

impl MemoryDocument {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append pre-analyzed tokens to `field`. Empty tokens are holes.
    pub fn tokens<I, S>(mut self, field: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens.into_iter().map(|t| t.as_ref().to_owned()).collect();
        self.fields.push((field.to_owned(), tokens));
        self
    }

    /// Tokenize `text` and append it to `field`.
    pub fn text(self, field: &str, text: &str) -> Self {
        self.tokens(field, tokenize(text))
    }
}

#[derive(Debug, Clone, Default)]
struct FieldBuilder {
    options: FieldOptions,
    dictionary: DictionaryBuilder,
    streams: FxHashMap<DocId, Vec<TermId>>,
}

/// Accumulates documents and produces immutable [`MemoryIndex`] snapshots.
#[derive(Debug, Clone)]
pub struct MemoryIndexBuilder {
    directory: PathBuf,
    generation: Generation,
    doc_count: u32,
    deleted: Vec<DocId>,
    fields: FxHashMap<String, FieldBuilder>,
}

impl MemoryIndexBuilder {
    /// Builder for an index living in `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        MemoryIndexBuilder {
            directory: directory.into(),
            generation: Generation::default(),
            doc_count: 0,
            deleted: Vec::new(),
            fields: FxHashMap::default(),
        }
    }

    /// Set the generation the next commit will follow.
    pub fn with_generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }

    /// Declare how `field` is indexed. Applies to the whole field.
    pub fn field_options(&mut self, field: &str, options: FieldOptions) -> &mut Self {
        self.fields.entry(field.to_owned()).or_default().options = options;
        self
    }

    /// Add a document; returns its id.
    pub fn add_document(&mut self, doc: MemoryDocument) -> DocId {
        let doc_id = self.doc_count;
        self.doc_count += 1;
        for (name, tokens) in doc.fields {
            let field = self.fields.entry(name).or_default();
            let ids: Vec<TermId> = tokens
                .iter()
                .map(|t| field.dictionary.intern(t.as_bytes()))
                .collect();
            field.streams.entry(doc_id).or_default().extend(ids);
        }
        doc_id
    }

    /// Mark `doc` deleted. Returns false for unknown or already deleted ids.
    pub fn delete(&mut self, doc: DocId) -> bool {
        if doc >= self.doc_count || self.deleted.contains(&doc) {
            return false;
        }
        self.deleted.push(doc);
        true
    }

    /// Number of documents added so far, deleted ones included.
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Seal the current state into a snapshot stamped with the next generation.
    pub fn commit(&mut self) -> MemoryIndex {
        self.generation = self.generation.next();
        let live_docs = if self.deleted.is_empty() {
            None
        } else {
            let mut live = BitSet::full(self.doc_count as usize);
            for &doc in &self.deleted {
                live.reset(doc as usize);
            }
            Some(live)
        };
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), MemoryField::seal(field, self.doc_count)))
            .collect();
        MemoryIndex {
            directory: self.directory.clone(),
            generation: self.generation,
            doc_count: self.doc_count,
            live_docs,
            fields,
        }
    }
}

#[derive(Debug, Clone)]
struct FieldDoc {
    tokens: Vec<TermId>,
    // sorted by term id, holes excluded
    terms: Vec<(TermId, Vec<u32>)>,
}

/// Sealed postings of one field of a [`MemoryIndex`].
#[derive(Debug, Clone)]
pub struct MemoryField {
    options: FieldOptions,
    dictionary: FrozenDictionary,
    doc_count: u32,
    docs: FxHashMap<DocId, FieldDoc>,
    postings: FxHashMap<TermId, Vec<DocId>>,
}

impl MemoryField {
    fn seal(builder: &FieldBuilder, doc_count: u32) -> Self {
        let mut docs = FxHashMap::default();
        let mut postings: FxHashMap<TermId, Vec<DocId>> = FxHashMap::default();
        let mut doc_ids: Vec<DocId> = builder.streams.keys().copied().collect();
        doc_ids.sort_unstable();

        for doc in doc_ids {
            let tokens = builder.streams[&doc].clone();
            let mut by_term: FxHashMap<TermId, Vec<u32>> = FxHashMap::default();
            for (pos, &term) in tokens.iter().enumerate() {
                if term != HOLE_TERM_ID {
                    by_term.entry(term).or_default().push(pos as u32);
                }
            }
            let mut terms: Vec<(TermId, Vec<u32>)> = by_term.into_iter().collect();
            terms.sort_unstable_by_key(|(term, _)| *term);
            for (term, _) in &terms {
                postings.entry(*term).or_default().push(doc);
            }
            docs.insert(doc, FieldDoc { tokens, terms });
        }

        MemoryField {
            options: builder.options,
            dictionary: builder.dictionary.clone().freeze(),
            doc_count,
            docs,
            postings,
        }
    }

    /// Frozen dictionary of the field.
    pub fn frozen_dictionary(&self) -> &FrozenDictionary {
        &self.dictionary
    }

    /// Token stream of `doc` as term ids, holes included.
    pub fn tokens(&self, doc: DocId) -> Option<&[TermId]> {
        self.docs.get(&doc).map(|d| &d.tokens[..])
    }
}

impl FieldPostings for MemoryField {
    fn dictionary(&self) -> &dyn TermDictionary {
        &self.dictionary
    }

    fn has_positions(&self) -> bool {
        self.options.positions
    }

    fn token_count(&self, doc: DocId) -> Option<u32> {
        if !self.options.token_counts || doc >= self.doc_count {
            return None;
        }
        Some(self.docs.get(&doc).map_or(0, |d| d.tokens.len() as u32))
    }

    fn positions_of(&self, term: TermId, doc: DocId, out: &mut Vec<u32>) {
        if !self.options.positions {
            return;
        }
        if let Some(d) = self.docs.get(&doc) {
            if let Ok(i) = d.terms.binary_search_by_key(&term, |(t, _)| *t) {
                out.extend_from_slice(&d.terms[i].1);
            }
        }
    }

    fn visit_doc_terms(&self, doc: DocId, visitor: &mut dyn FnMut(TermId, &[u32])) {
        if let Some(d) = self.docs.get(&doc) {
            for (term, positions) in &d.terms {
                if self.options.positions {
                    visitor(*term, positions);
                } else {
                    visitor(*term, &[]);
                }
            }
        }
    }

    fn docs_with_term(&self, term: TermId, out: &mut Vec<DocId>) {
        if let Some(docs) = self.postings.get(&term) {
            out.extend_from_slice(docs);
        }
    }
}

/// Immutable in-memory index snapshot.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    directory: PathBuf,
    generation: Generation,
    doc_count: u32,
    live_docs: Option<BitSet>,
    fields: FxHashMap<String, MemoryField>,
}

impl MemoryIndex {
    /// Concrete access to a field, for assertions against its token streams.
    pub fn memory_field(&self, name: &str) -> Option<&MemoryField> {
        self.fields.get(name)
    }
}

impl IndexSnapshot for MemoryIndex {
    fn doc_count(&self) -> u32 {
        self.doc_count
    }

    fn generation(&self) -> Generation {
        self.generation
    }

    fn directory(&self) -> &Path {
        &self.directory
    }

    fn live_docs(&self) -> Option<&BitSet> {
        self.live_docs.as_ref()
    }

    fn field(&self, name: &str) -> Option<&dyn FieldPostings> {
        self.fields.get(name).map(|f| f as &dyn FieldPostings)
    }
}
