//! Scans over a loaded rail
//!
//! Every scan is a pure function of `(store, options, query)`: it allocates
//! private accumulators, never mutates the store and shares nothing with
//! concurrent scans.
//!
//! ## Strategies
//!
//! - `Sequential` (default): one pass with one accumulator.
//! - `PartitionedParallel`: documents split into disjoint ranges reduced
//!   independently on the rayon pool, then merged. Kept for experiments;
//!   a single pass is usually as fast because scans are memory bound.

pub mod cooccurrence;
pub mod edges;
pub mod frequency;
pub mod score;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use railstat_core::{
    try_zeroed, BitSet, DocId, FieldPostings, IndexSnapshot, RailError, RailResult,
    SparseIntMap, TermId,
};
use rayon::prelude::*;

use crate::config::RailConfig;

pub use cooccurrence::{CooccurrenceScanner, Cooccurrences};
pub use edges::{EdgeCounts, EdgeScanner};
pub use frequency::FrequencyScanner;
pub use score::{score, AssocMeasure};

// ============================================================================
// Options
// ============================================================================

/// How documents are distributed over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStrategy {
    /// Single pass, single accumulator
    #[default]
    Sequential,
    /// Disjoint document ranges reduced on the rayon pool
    PartitionedParallel {
        /// Number of ranges; 0 = rayon thread count
        partitions: usize,
    },
}

/// Cooperative cancellation flag, checked once per document.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Document selection and execution settings of one scan.
///
/// The default selects every document of the rail, sequentially.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions<'a> {
    /// Only documents whose bit is set
    pub filter: Option<&'a BitSet>,
    /// Only live documents; `None` keeps deleted documents too
    pub live_docs: Option<&'a BitSet>,
    /// Abort with [`RailError::Cancelled`] once set
    pub cancel: Option<&'a CancellationToken>,
    /// Execution strategy
    pub strategy: ScanStrategy,
}

impl<'a> ScanOptions<'a> {
    /// Every document, sequentially.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every document, with the strategy configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RailError::Config`] if the configured strategy is unknown.
    pub fn from_config(config: &RailConfig) -> RailResult<Self> {
        Ok(Self::new().with_strategy(config.scan_strategy()?))
    }

    /// Restrict to documents set in `filter`.
    pub fn with_filter(mut self, filter: &'a BitSet) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Restrict to documents live in `index`.
    pub fn live_in(mut self, index: &'a dyn IndexSnapshot) -> Self {
        self.live_docs = index.live_docs();
        self
    }

    /// Check `token` once per document.
    pub fn with_cancel(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Use `strategy`.
    pub fn with_strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[inline]
    fn selects(&self, doc: DocId) -> bool {
        self.filter.map_or(true, |f| f.contains(doc as usize))
            && self.live_docs.map_or(true, |l| l.contains(doc as usize))
    }

    #[inline]
    fn check_cancelled(&self) -> RailResult<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(RailError::Cancelled),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Counters
// ============================================================================

/// Per-term accumulator a scan counts into.
pub trait Counter: Send + Sized {
    /// Empty counter for term ids `0..size`.
    fn for_dictionary(size: usize) -> RailResult<Self>;

    /// Count one occurrence of `term`; `term` is below the dictionary size.
    fn count(&mut self, term: TermId);

    /// Add every count of `other`.
    fn merge(&mut self, other: Self);
}

impl Counter for Vec<u64> {
    fn for_dictionary(size: usize) -> RailResult<Self> {
        try_zeroed(size)
    }

    #[inline]
    fn count(&mut self, term: TermId) {
        self[term as usize] += 1;
    }

    fn merge(&mut self, other: Self) {
        for (a, b) in self.iter_mut().zip(other) {
            *a += b;
        }
    }
}

impl Counter for SparseIntMap {
    fn for_dictionary(_size: usize) -> RailResult<Self> {
        Ok(SparseIntMap::new())
    }

    #[inline]
    fn count(&mut self, term: TermId) {
        self.inc(term as u64);
    }

    fn merge(&mut self, other: Self) {
        for (key, value) in other.iter() {
            self.add(key, value);
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Per-partition scan state.
pub(crate) trait Accumulator: Send + Sized {
    /// Visit one selected document.
    fn visit(&mut self, doc: DocId) -> RailResult<()>;

    /// Fold another partition's state into this one.
    fn merge(&mut self, other: Self);
}

/// Run `make()`-built accumulators over the selected documents.
///
/// `candidates`, when given, lists the only documents worth visiting
/// (ascending); otherwise every doc id below `doc_count` is a candidate.
pub(crate) fn run<A, F>(
    options: &ScanOptions<'_>,
    doc_count: u32,
    candidates: Option<&[DocId]>,
    make: F,
) -> RailResult<A>
where
    A: Accumulator,
    F: Fn() -> RailResult<A> + Sync,
{
    match options.strategy {
        ScanStrategy::Sequential => {
            let mut acc = make()?;
            match (candidates, options.filter) {
                (Some(list), _) => visit_all(&mut acc, options, list.iter().copied())?,
                (None, Some(filter)) => visit_all(
                    &mut acc,
                    options,
                    filter
                        .iter()
                        .take_while(|&d| d < doc_count as usize)
                        .map(|d| d as DocId),
                )?,
                (None, None) => visit_all(&mut acc, options, 0..doc_count)?,
            }
            Ok(acc)
        }
        ScanStrategy::PartitionedParallel { partitions } => {
            let partitions = if partitions == 0 {
                rayon::current_num_threads()
            } else {
                partitions
            };
            let parts: Vec<A> = match candidates {
                Some(list) => {
                    let chunk = list.len().div_ceil(partitions).max(1);
                    list.par_chunks(chunk)
                        .map(|docs| {
                            let mut acc = make()?;
                            visit_all(&mut acc, options, docs.iter().copied())?;
                            Ok(acc)
                        })
                        .collect::<RailResult<Vec<A>>>()?
                }
                None => {
                    let chunk = (doc_count as usize).div_ceil(partitions).max(1) as u32;
                    let starts: Vec<u32> = (0..doc_count).step_by(chunk as usize).collect();
                    starts
                        .into_par_iter()
                        .map(|start| {
                            let end = start.saturating_add(chunk).min(doc_count);
                            let mut acc = make()?;
                            visit_all(&mut acc, options, start..end)?;
                            Ok(acc)
                        })
                        .collect::<RailResult<Vec<A>>>()?
                }
            };
            let mut parts = parts.into_iter();
            let mut acc = match parts.next() {
                Some(first) => first,
                None => make()?,
            };
            for part in parts {
                acc.merge(part);
            }
            Ok(acc)
        }
    }
}

fn visit_all<A: Accumulator>(
    acc: &mut A,
    options: &ScanOptions<'_>,
    docs: impl Iterator<Item = DocId>,
) -> RailResult<()> {
    for doc in docs {
        options.check_cancelled()?;
        if options.selects(doc) {
            acc.visit(doc)?;
        }
    }
    Ok(())
}

// ============================================================================
// Pivots
// ============================================================================

/// Sorted, de-duplicated pivots, all inside the dictionary.
pub(crate) fn normalize_pivots(
    pivots: &[TermId],
    dictionary_size: usize,
) -> RailResult<Vec<TermId>> {
    if pivots.is_empty() {
        return Err(RailError::invalid_input("empty pivot set"));
    }
    if let Some(&bad) = pivots.iter().find(|&&p| p as usize >= dictionary_size) {
        return Err(RailError::invalid_input(format!(
            "pivot {} outside dictionary of size {}",
            bad, dictionary_size
        )));
    }
    let mut pivots = pivots.to_vec();
    pivots.sort_unstable();
    pivots.dedup();
    Ok(pivots)
}

/// Ascending documents below `doc_count` holding at least one pivot.
pub(crate) fn pivot_docs(
    postings: &dyn FieldPostings,
    pivots: &[TermId],
    doc_count: u32,
) -> Vec<DocId> {
    let mut docs = Vec::new();
    for &pivot in pivots {
        postings.docs_with_term(pivot, &mut docs);
    }
    docs.sort_unstable();
    docs.dedup();
    docs.retain(|&doc| doc < doc_count);
    docs
}

/// Fill `out` with every pivot position of `doc`, ascending.
///
/// Fails with [`RailError::InvalidInput`] when a position lies past the
/// rail length: the postings then describe another index than the rail.
pub(crate) fn pivot_positions(
    postings: &dyn FieldPostings,
    pivots: &[TermId],
    doc: DocId,
    len: usize,
    out: &mut Vec<u32>,
) -> RailResult<()> {
    out.clear();
    for &pivot in pivots {
        postings.positions_of(pivot, doc, out);
    }
    if let Some(&bad) = out.iter().find(|&&p| p as usize >= len) {
        return Err(RailError::invalid_input(format!(
            "doc {} pivot position {} outside rail of length {}; postings do not match the rail",
            doc, bad, len
        )));
    }
    out.sort_unstable();
    Ok(())
}

/// Context span `[p - left, p + right]` around a position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Window {
    pub(crate) left: usize,
    pub(crate) right: usize,
}

impl Window {
    /// Positions covered around `p` in a rail of `len`, clamped.
    #[inline]
    pub(crate) fn around(&self, p: usize, len: usize) -> std::ops::Range<usize> {
        let start = p.saturating_sub(self.left);
        let end = p.saturating_add(self.right).saturating_add(1).min(len);
        start..end
    }
}

/// Fail with [`RailError::UnknownTermId`] unless `term < dictionary_size`.
#[inline]
pub(crate) fn check_term(
    term: TermId,
    dictionary_size: usize,
    doc: DocId,
    position: usize,
) -> RailResult<()> {
    if (term as usize) < dictionary_size {
        Ok(())
    } else {
        Err(RailError::UnknownTermId {
            term_id: term,
            dictionary_size,
            doc_id: doc,
            position: position as u32,
        })
    }
}
