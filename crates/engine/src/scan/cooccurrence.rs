//! Windowed co-occurrence counts around pivot terms
//!
//! Per selected document of length `len` holding at least one pivot:
//!
//! ```text
//! pivot_mask = { p : rail[p] is a pivot occurrence }
//! context    = ∪ [max(0, p − L), min(len, p + R + 1))  for p in pivot_mask
//! context   &= !pivot_mask
//! counts[rail[q]] += 1                                  for q in context
//! ```
//!
//! Overlapping windows are merged before counting, so a position shared by
//! several windows is counted once, and a pivot position is never context.
//! Documents are found through the pivots' posting lists, not by walking
//! every rail.

use std::time::Instant;

use railstat_core::{
    BitSet, DocId, FieldPostings, RailError, RailResult, SparseIntMap, TermId,
};
use tracing::debug;

use super::{
    check_term, normalize_pivots, pivot_docs, pivot_positions, run, Accumulator, Counter,
    ScanOptions, Window,
};
use crate::rail::RailStore;

/// Context-term counts and scan statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Cooccurrences<C = Vec<u64>> {
    /// Occurrences of each term inside the merged context windows
    pub counts: C,
    /// Documents in which each term was counted at least once
    pub hits: C,
    /// Pivot occurrences seen in matched documents
    pub pivot_occurrences: u64,
    /// Context positions counted (sum of `counts`)
    pub context_tokens: u64,
    /// Documents containing at least one pivot
    pub docs_matched: u64,
}

impl<C> Cooccurrences<C> {
    /// Just the counts.
    pub fn into_counts(self) -> C {
        self.counts
    }
}

/// Counts terms around pivot occurrences.
pub struct CooccurrenceScanner;

impl CooccurrenceScanner {
    /// Co-occurrence counts of terms within `left` positions before and
    /// `right` positions after any occurrence of a pivot.
    ///
    /// `postings` must be the field the store was built from; it supplies
    /// the documents and positions of the pivots.
    ///
    /// # Errors
    ///
    /// - [`RailError::InvalidInput`] for an empty pivot set, a pivot outside the
    ///   dictionary, or a pivot position past the end of its rail
    /// - [`RailError::UnknownTermId`] if a rail value is outside the dictionary
    /// - [`RailError::CapacityOverflow`] if the dense result cannot be allocated
    /// - [`RailError::Cancelled`]
    pub fn scan(
        store: &RailStore,
        postings: &dyn FieldPostings,
        pivots: &[TermId],
        left: usize,
        right: usize,
        options: &ScanOptions<'_>,
    ) -> RailResult<Cooccurrences> {
        Self::scan_with(store, postings, pivots, left, right, options)
    }

    /// Like [`scan`](Self::scan), with sparse accumulators.
    pub fn scan_sparse(
        store: &RailStore,
        postings: &dyn FieldPostings,
        pivots: &[TermId],
        left: usize,
        right: usize,
        options: &ScanOptions<'_>,
    ) -> RailResult<Cooccurrences<SparseIntMap>> {
        Self::scan_with(store, postings, pivots, left, right, options)
    }

    /// Scan into any [`Counter`].
    pub fn scan_with<C: Counter>(
        store: &RailStore,
        postings: &dyn FieldPostings,
        pivots: &[TermId],
        left: usize,
        right: usize,
        options: &ScanOptions<'_>,
    ) -> RailResult<Cooccurrences<C>> {
        let started = Instant::now();
        let pivots = normalize_pivots(pivots, store.dictionary_size())?;

        let candidates = pivot_docs(postings, &pivots, store.doc_count());

        let window = Window { left, right };
        let acc = run(options, store.doc_count(), Some(candidates.as_slice()), || {
            Ok(CooccurrenceAccumulator {
                store,
                postings,
                pivots: &pivots,
                window,
                result: Cooccurrences {
                    counts: C::for_dictionary(store.dictionary_size())?,
                    hits: C::for_dictionary(store.dictionary_size())?,
                    pivot_occurrences: 0,
                    context_tokens: 0,
                    docs_matched: 0,
                },
                positions: Vec::new(),
                context: BitSet::default(),
                pivot_mask: BitSet::default(),
                doc_terms: Vec::new(),
            })
        })?;

        debug!(
            target: "railstat::scan",
            field = store.field(),
            pivots = pivots.len(),
            left,
            right,
            candidates = candidates.len(),
            docs_matched = acc.result.docs_matched,
            context_tokens = acc.result.context_tokens,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Co-occurrence scan"
        );
        Ok(acc.result)
    }
}

struct CooccurrenceAccumulator<'a, C> {
    store: &'a RailStore,
    postings: &'a dyn FieldPostings,
    pivots: &'a [TermId],
    window: Window,
    result: Cooccurrences<C>,
    // scratch, reused across documents
    positions: Vec<u32>,
    context: BitSet,
    pivot_mask: BitSet,
    doc_terms: Vec<TermId>,
}

impl<C: Counter> Accumulator for CooccurrenceAccumulator<'_, C> {
    fn visit(&mut self, doc: DocId) -> RailResult<()> {
        let len = self.store.rail_length(doc);
        if len == 0 {
            return Ok(());
        }

        pivot_positions(self.postings, self.pivots, doc, len, &mut self.positions)?;
        if self.positions.is_empty() {
            return Ok(());
        }

        self.context.reset_to(len);
        self.pivot_mask.reset_to(len);
        for &p in &self.positions {
            let p = p as usize;
            self.pivot_mask.set(p);
            self.context.set_range(self.window.around(p, len));
        }
        self.context.and_not(&self.pivot_mask);

        let rail = self.store.rail_slice(doc);
        let size = self.store.dictionary_size();
        self.doc_terms.clear();
        for position in self.context.iter() {
            let term = rail.get(position).ok_or_else(|| {
                RailError::invalid_input(format!(
                    "doc {} position {} outside rail of length {}",
                    doc,
                    position,
                    rail.len()
                ))
            })?;
            check_term(term, size, doc, position)?;
            self.result.counts.count(term);
            self.doc_terms.push(term);
        }
        self.doc_terms.sort_unstable();
        self.doc_terms.dedup();
        for &term in &self.doc_terms {
            self.result.hits.count(term);
        }

        self.result.pivot_occurrences += self.pivot_mask.count_ones() as u64;
        self.result.context_tokens += self.context.count_ones() as u64;
        self.result.docs_matched += 1;
        Ok(())
    }

    fn merge(&mut self, other: Self) {
        self.result.counts.merge(other.result.counts);
        self.result.hits.merge(other.result.hits);
        self.result.pivot_occurrences += other.result.pivot_occurrences;
        self.result.context_tokens += other.result.context_tokens;
        self.result.docs_matched += other.result.docs_matched;
    }
}
