//! A fixed-size array of bits.
//!
//! Serves both as the document filter / live-docs set over the global
//! document id space and as the per-document `context` and `pivot` masks of
//! the co-occurrence scanner.
//!
//! Bits are stored LSB-first in `u64` words; bit `i` lives in word `i / 64`.
//! Bits beyond `len` in the final word are always zero, so `count_ones` and
//! the set-bit iterator never need to mask.

use std::ops::Range;

const WORD_BITS: usize = 64;

/// A fixed-size array of bits with `[u64]` storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitSet {
    len: usize,
    words: Vec<u64>,
}

impl BitSet {
    /// All-zero set of `len` bits.
    pub fn new(len: usize) -> Self {
        BitSet {
            len,
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    /// All-one set of `len` bits.
    pub fn full(len: usize) -> Self {
        let mut set = BitSet::new(len);
        set.set_range(0..len);
        set
    }

    /// Set with the given positions raised. Positions `>= len` are ignored.
    pub fn from_positions(positions: impl IntoIterator<Item = usize>, len: usize) -> Self {
        let mut set = BitSet::new(len);
        for pos in positions {
            if pos < len {
                set.set(pos);
            }
        }
        set
    }

    /// Number of addressable bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the set addresses no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raise bit `index`.
    ///
    /// # Panics
    /// If `index >= len`.
    #[inline]
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len, "bit {} out of range {}", index, self.len);
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    /// Lower bit `index`.
    ///
    /// # Panics
    /// If `index >= len`.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        assert!(index < self.len, "bit {} out of range {}", index, self.len);
        self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
    }

    /// Value of bit `index`; out-of-range bits read as unset.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Raise every bit in `range`, clamped to `len`.
    pub fn set_range(&mut self, range: Range<usize>) {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len);
        if start >= end {
            return;
        }
        let first = start / WORD_BITS;
        let last = (end - 1) / WORD_BITS;
        let head = u64::MAX << (start % WORD_BITS);
        let tail = u64::MAX >> (WORD_BITS - 1 - (end - 1) % WORD_BITS);
        if first == last {
            self.words[first] |= head & tail;
            return;
        }
        self.words[first] |= head;
        for word in &mut self.words[first + 1..last] {
            *word = u64::MAX;
        }
        self.words[last] |= tail;
    }

    /// Lower every bit.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Lower every bit and re-size to `len`, reusing the allocation.
    pub fn reset_to(&mut self, len: usize) {
        self.len = len;
        self.words.clear();
        self.words.resize(len.div_ceil(WORD_BITS), 0);
    }

    /// `self &= !other` over the common prefix.
    pub fn and_not(&mut self, other: &BitSet) {
        for (word, mask) in self.words.iter_mut().zip(&other.words) {
            *word &= !mask;
        }
    }

    /// `self |= other` over the common prefix.
    pub fn union_with(&mut self, other: &BitSet) {
        for (word, mask) in self.words.iter_mut().zip(&other.words) {
            *word |= mask;
        }
        self.mask_tail();
    }

    /// `self &= other`; bits beyond `other.len()` are lowered.
    pub fn intersect_with(&mut self, other: &BitSet) {
        for (i, word) in self.words.iter_mut().enumerate() {
            *word &= other.words.get(i).copied().unwrap_or(0);
        }
    }

    /// Number of raised bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate raised bit positions in ascending order.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            words: &self.words,
            word_index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Underlying words, LSB-first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    fn mask_tail(&mut self) {
        let rem = self.len % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

/// Ascending iterator over raised bits of a [`BitSet`].
pub struct BitSetIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current: u64,
}

impl<'a> Iterator for BitSetIter<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word_index * WORD_BITS + bit);
            }
            self.word_index += 1;
            if self.word_index >= self.words.len() {
                return None;
            }
            self.current = self.words[self.word_index];
        }
    }
}

impl FromIterator<bool> for BitSet {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let flags: Vec<bool> = iter.into_iter().collect();
        let mut set = BitSet::new(flags.len());
        for (i, flag) in flags.into_iter().enumerate() {
            if flag {
                set.set(i);
            }
        }
        set
    }
}
