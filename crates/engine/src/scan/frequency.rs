//! Raw term frequencies over selected documents

use std::time::Instant;

use railstat_core::{DocId, RailResult, SparseIntMap};
use tracing::debug;

use super::{check_term, run, Accumulator, Counter, ScanOptions};
use crate::rail::RailStore;

/// Counts every position of every selected document.
pub struct FrequencyScanner;

impl FrequencyScanner {
    /// `result[t]` = occurrences of term `t` across the selected documents.
    ///
    /// Holes are counted under their own id.
    ///
    /// # Errors
    ///
    /// - [`railstat_core::RailError::UnknownTermId`] if a rail value is outside the dictionary
    /// - [`railstat_core::RailError::CapacityOverflow`] if the dense result cannot be allocated
    /// - [`railstat_core::RailError::Cancelled`]
    pub fn scan(store: &RailStore, options: &ScanOptions<'_>) -> RailResult<Vec<u64>> {
        Self::scan_with(store, options)
    }

    /// Like [`scan`](Self::scan), keyed by term id in a sparse map.
    ///
    /// Preferable when few documents are selected over a large dictionary.
    pub fn scan_sparse(store: &RailStore, options: &ScanOptions<'_>) -> RailResult<SparseIntMap> {
        Self::scan_with(store, options)
    }

    /// Scan into any [`Counter`].
    pub fn scan_with<C: Counter>(store: &RailStore, options: &ScanOptions<'_>) -> RailResult<C> {
        let started = Instant::now();
        let acc = run(options, store.doc_count(), None, || {
            Ok(FrequencyAccumulator {
                store,
                counts: C::for_dictionary(store.dictionary_size())?,
                docs: 0,
                tokens: 0,
            })
        })?;
        debug!(
            target: "railstat::scan",
            field = store.field(),
            docs = acc.docs,
            tokens = acc.tokens,
            strategy = ?options.strategy,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Frequency scan"
        );
        Ok(acc.counts)
    }
}

struct FrequencyAccumulator<'a, C> {
    store: &'a RailStore,
    counts: C,
    docs: u64,
    tokens: u64,
}

impl<C: Counter> Accumulator for FrequencyAccumulator<'_, C> {
    fn visit(&mut self, doc: DocId) -> RailResult<()> {
        let rail = self.store.rail_slice(doc);
        if rail.is_empty() {
            return Ok(());
        }
        let size = self.store.dictionary_size();
        for (position, term) in rail.iter().enumerate() {
            check_term(term, size, doc, position)?;
            self.counts.count(term);
        }
        self.docs += 1;
        self.tokens += rail.len() as u64;
        Ok(())
    }

    fn merge(&mut self, other: Self) {
        self.counts.merge(other.counts);
        self.docs += other.docs;
        self.tokens += other.tokens;
    }
}
