//! Term×term proximity counts among a set of node terms
//!
//! Two ways to pair nodes:
//!
//! - [`EdgeScanner::scan`] rolls a window of `distance` positions over every
//!   selected rail. Each new node occurrence pairs once with every distinct
//!   other node seen since the previous occurrence of the same node inside
//!   the window, so `a a b` yields `{a, b}` once, not twice.
//! - [`EdgeScanner::scan_around`] only looks inside the clamped window of
//!   each pivot occurrence, and counts every pair of node occurrences of two
//!   different terms in that window.
//!
//! Counts live in a [`SparseIntMap`] keyed by [`PairKey`] of `(min, max)`.

use std::collections::VecDeque;
use std::time::Instant;

use railstat_core::{
    BitSet, DocId, FieldPostings, PairKey, RailError, RailResult, SparseIntMap, TermId,
    HOLE_TERM_ID,
};
use tracing::debug;

use super::{
    check_term, normalize_pivots, pivot_docs, pivot_positions, run, Accumulator, Counter,
    ScanOptions, Window,
};
use crate::rail::RailStore;

/// Pair counts between node terms.
#[derive(Debug, Clone, Default)]
pub struct EdgeCounts {
    pairs: SparseIntMap,
    nodes: SparseIntMap,
    docs: u64,
}

impl EdgeCounts {
    /// Count of the unordered pair `{a, b}`.
    pub fn get(&self, a: TermId, b: TermId) -> u64 {
        let count = self.pairs.get(pair_key(a, b));
        if count == self.pairs.no_value() {
            0
        } else {
            count as u64
        }
    }

    /// Occurrences of node `term` counted by the scan: over whole rails for
    /// [`EdgeScanner::scan`], inside each pivot window for
    /// [`EdgeScanner::scan_around`].
    pub fn node_count(&self, term: TermId) -> u64 {
        let count = self.nodes.get(term as u64);
        if count == self.nodes.no_value() {
            0
        } else {
            count as u64
        }
    }

    /// `(min, max, count)` for every pair seen, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, TermId, u64)> + '_ {
        self.pairs.iter().map(|(key, count)| {
            let key = PairKey::from_u64(key);
            (key.first(), key.second(), count as u64)
        })
    }

    /// Pairs by descending count, then ascending ids.
    pub fn sorted(&self) -> Vec<(TermId, TermId, u64)> {
        let mut edges: Vec<_> = self.iter().collect();
        edges.sort_unstable_by(|x, y| y.2.cmp(&x.2).then(x.0.cmp(&y.0)).then(x.1.cmp(&y.1)));
        edges
    }

    /// Number of distinct pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pair was seen.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Documents that contributed: with a node occurrence for
    /// [`EdgeScanner::scan`], with a pivot occurrence for
    /// [`EdgeScanner::scan_around`].
    pub fn docs(&self) -> u64 {
        self.docs
    }
}

fn pair_key(a: TermId, b: TermId) -> u64 {
    PairKey::from_ids(a.min(b), a.max(b)).as_u64()
}

/// Counts proximity pairs among node terms.
pub struct EdgeScanner;

impl EdgeScanner {
    /// Pair counts among `nodes` within `distance` positions.
    ///
    /// # Errors
    ///
    /// - [`RailError::InvalidInput`] for `distance == 0`, an empty node set,
    ///   a hole or an id outside the dictionary
    /// - [`RailError::UnknownTermId`] if a rail value is outside the dictionary
    /// - [`RailError::Cancelled`]
    pub fn scan(
        store: &RailStore,
        nodes: &[TermId],
        distance: usize,
        options: &ScanOptions<'_>,
    ) -> RailResult<EdgeCounts> {
        if distance == 0 {
            return Err(RailError::invalid_input("edge distance must be positive"));
        }
        let node_mask = node_mask(nodes, store.dictionary_size())?;

        let started = Instant::now();
        let acc = run(options, store.doc_count(), None, || {
            Ok(EdgeAccumulator {
                store,
                node_mask: &node_mask,
                distance,
                counts: EdgeCounts::default(),
                window: VecDeque::new(),
                co_nodes: Vec::new(),
            })
        })?;
        debug!(
            target: "railstat::scan",
            field = store.field(),
            nodes = node_mask.count_ones(),
            distance,
            pairs = acc.counts.len(),
            docs = acc.counts.docs,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Edge scan"
        );
        Ok(acc.counts)
    }

    /// Pair counts among `nodes` inside the windows of `left` positions
    /// before and `right` positions after each pivot occurrence.
    ///
    /// Every pivot occurrence contributes its own window, pivot position
    /// included, so overlapping windows count their shared pairs again.
    /// `postings` must be the field the store was built from.
    ///
    /// # Errors
    ///
    /// - [`RailError::InvalidInput`] for an empty pivot or node set, an id
    ///   outside the dictionary, a hole node, or a pivot position past the
    ///   end of its rail
    /// - [`RailError::UnknownTermId`] if a rail value is outside the dictionary
    /// - [`RailError::Cancelled`]
    pub fn scan_around(
        store: &RailStore,
        postings: &dyn FieldPostings,
        pivots: &[TermId],
        left: usize,
        right: usize,
        nodes: &[TermId],
        options: &ScanOptions<'_>,
    ) -> RailResult<EdgeCounts> {
        let started = Instant::now();
        let pivots = normalize_pivots(pivots, store.dictionary_size())?;
        let node_mask = node_mask(nodes, store.dictionary_size())?;
        let candidates = pivot_docs(postings, &pivots, store.doc_count());

        let window = Window { left, right };
        let acc = run(options, store.doc_count(), Some(candidates.as_slice()), || {
            Ok(AroundAccumulator {
                store,
                postings,
                pivots: &pivots,
                window,
                node_mask: &node_mask,
                counts: EdgeCounts::default(),
                positions: Vec::new(),
                found: Vec::new(),
            })
        })?;
        debug!(
            target: "railstat::scan",
            field = store.field(),
            pivots = pivots.len(),
            nodes = node_mask.count_ones(),
            left,
            right,
            candidates = candidates.len(),
            pairs = acc.counts.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Edge scan around pivots"
        );
        Ok(acc.counts)
    }
}

fn node_mask(nodes: &[TermId], dictionary_size: usize) -> RailResult<BitSet> {
    if nodes.is_empty() {
        return Err(RailError::invalid_input("empty node set"));
    }
    let mut mask = BitSet::new(dictionary_size);
    for &node in nodes {
        if node == HOLE_TERM_ID || node as usize >= dictionary_size {
            return Err(RailError::invalid_input(format!(
                "node {} is not a term of a dictionary of size {}",
                node, dictionary_size
            )));
        }
        mask.set(node as usize);
    }
    Ok(mask)
}

fn merge_counts(into: &mut EdgeCounts, other: EdgeCounts) {
    Counter::merge(&mut into.pairs, other.pairs);
    Counter::merge(&mut into.nodes, other.nodes);
    into.docs += other.docs;
}

struct EdgeAccumulator<'a> {
    store: &'a RailStore,
    node_mask: &'a BitSet,
    distance: usize,
    counts: EdgeCounts,
    // (position, term) of node occurrences within reach
    window: VecDeque<(usize, TermId)>,
    co_nodes: Vec<TermId>,
}

impl Accumulator for EdgeAccumulator<'_> {
    fn visit(&mut self, doc: DocId) -> RailResult<()> {
        let rail = self.store.rail_slice(doc);
        let size = self.store.dictionary_size();
        let mut seen = false;
        self.window.clear();
        for (position, term) in rail.iter().enumerate() {
            check_term(term, size, doc, position)?;
            if !self.node_mask.contains(term as usize) {
                continue;
            }
            seen = true;
            self.counts.nodes.count(term);
            while let Some(&(first, _)) = self.window.front() {
                if position - first > self.distance {
                    self.window.pop_front();
                } else {
                    break;
                }
            }
            // older co-nodes were already paired by the previous `term`
            self.co_nodes.clear();
            for &(_, other) in self.window.iter().rev() {
                if other == term {
                    break;
                }
                if !self.co_nodes.contains(&other) {
                    self.co_nodes.push(other);
                }
            }
            for &other in &self.co_nodes {
                self.counts.pairs.inc(pair_key(term, other));
            }
            self.window.push_back((position, term));
        }
        if seen {
            self.counts.docs += 1;
        }
        Ok(())
    }

    fn merge(&mut self, other: Self) {
        merge_counts(&mut self.counts, other.counts);
    }
}

struct AroundAccumulator<'a> {
    store: &'a RailStore,
    postings: &'a dyn FieldPostings,
    pivots: &'a [TermId],
    window: Window,
    node_mask: &'a BitSet,
    counts: EdgeCounts,
    // scratch, reused across documents
    positions: Vec<u32>,
    found: Vec<TermId>,
}

impl Accumulator for AroundAccumulator<'_> {
    fn visit(&mut self, doc: DocId) -> RailResult<()> {
        let len = self.store.rail_length(doc);
        if len == 0 {
            return Ok(());
        }
        pivot_positions(self.postings, self.pivots, doc, len, &mut self.positions)?;
        if self.positions.is_empty() {
            return Ok(());
        }

        let rail = self.store.rail_slice(doc);
        let size = self.store.dictionary_size();
        for &pivot in &self.positions {
            self.found.clear();
            for position in self.window.around(pivot as usize, len) {
                let term = rail.get(position).ok_or_else(|| {
                    RailError::invalid_input(format!(
                        "doc {} position {} outside rail of length {}",
                        doc, position, len
                    ))
                })?;
                check_term(term, size, doc, position)?;
                if self.node_mask.contains(term as usize) {
                    self.found.push(term);
                }
            }
            for (i, &a) in self.found.iter().enumerate() {
                self.counts.nodes.count(a);
                for &b in &self.found[i + 1..] {
                    if a != b {
                        self.counts.pairs.inc(pair_key(a, b));
                    }
                }
            }
        }
        self.counts.docs += 1;
        Ok(())
    }

    fn merge(&mut self, other: Self) {
        merge_counts(&mut self.counts, other.counts);
    }
}
