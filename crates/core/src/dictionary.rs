//! Term dictionary: bijection between term bytes and dense ids
//!
//! The dictionary is an explicitly owned, frozen object. Builders hand it
//! out by reference to every component that needs it; nothing keeps a
//! process-wide term table.

use rustc_hash::FxHashMap;

use crate::types::{TermId, HOLE_TERM_ID};

/// Read access to a frozen term dictionary.
pub trait TermDictionary: Send + Sync {
    /// Number of ids; valid ids are `0..size()`.
    fn size(&self) -> usize;

    /// Id of `bytes`, if the term is known.
    fn id_of(&self, bytes: &[u8]) -> Option<TermId>;

    /// Bytes of `id`, if in range.
    fn bytes_of(&self, id: TermId) -> Option<&[u8]>;
}

/// Immutable dictionary with dense ids assigned in insertion order.
///
/// Id [`HOLE_TERM_ID`] always maps to the empty term.
#[derive(Debug, Clone)]
pub struct FrozenDictionary {
    terms: Vec<Box<[u8]>>,
    ids: FxHashMap<Box<[u8]>, TermId>,
}

impl FrozenDictionary {
    /// Iterate `(id, bytes)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &[u8])> + '_ {
        self.terms
            .iter()
            .enumerate()
            .map(|(id, bytes)| (id as TermId, &bytes[..]))
    }

    /// Lossy UTF-8 rendering of `id`, for diagnostics.
    pub fn term_str(&self, id: TermId) -> Option<String> {
        self.bytes_of(id)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl TermDictionary for FrozenDictionary {
    fn size(&self) -> usize {
        self.terms.len()
    }

    fn id_of(&self, bytes: &[u8]) -> Option<TermId> {
        self.ids.get(bytes).copied()
    }

    fn bytes_of(&self, id: TermId) -> Option<&[u8]> {
        self.terms.get(id as usize).map(|b| &b[..])
    }
}

/// Mutable phase of a dictionary; consumed by [`DictionaryBuilder::freeze`].
#[derive(Debug, Clone)]
pub struct DictionaryBuilder {
    terms: Vec<Box<[u8]>>,
    ids: FxHashMap<Box<[u8]>, TermId>,
}

impl Default for DictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionaryBuilder {
    /// Start a dictionary with the hole term already at id 0.
    pub fn new() -> Self {
        let mut builder = DictionaryBuilder {
            terms: Vec::new(),
            ids: FxHashMap::default(),
        };
        let hole = builder.intern(b"");
        debug_assert_eq!(hole, HOLE_TERM_ID);
        builder
    }

    /// Id of `bytes`, assigning the next dense id when new.
    pub fn intern(&mut self, bytes: &[u8]) -> TermId {
        if let Some(&id) = self.ids.get(bytes) {
            return id;
        }
        let id = self.terms.len() as TermId;
        let owned: Box<[u8]> = bytes.into();
        self.terms.push(owned.clone());
        self.ids.insert(owned, id);
        id
    }

    /// Number of ids assigned so far.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false: the hole term is present from the start.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Freeze into a read-only dictionary.
    pub fn freeze(self) -> FrozenDictionary {
        FrozenDictionary {
            terms: self.terms,
            ids: self.ids,
        }
    }
}
