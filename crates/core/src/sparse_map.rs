//! Open-addressed integer accumulator
//!
//! `SparseIntMap` maps `u64` keys to `i64` values with linear probing over
//! two flat arrays. It never boxes an entry, which keeps millions of sparse
//! counters cheap where a dense `Vec` of dictionary size would be wasteful
//! (term × term pair counts keyed by [`crate::PairKey`]).
//!
//! # Key zero
//!
//! Key `0` marks a free cell in the key array. The real key `0` is stored
//! out of band behind a presence flag, so it never collides with the
//! free-cell marker.
//!
//! # Removal
//!
//! Removal uses backward-shift deletion: the collision chain after the removed
//! slot is compacted, so no tombstones accumulate and lookups stay short.

/// Marker for a free cell in the key array.
const FREE_KEY: u64 = 0;
/// Default value returned for absent keys.
pub const DEFAULT_NO_VALUE: i64 = i64::MIN;
/// Default fill factor before a resize.
const DEFAULT_FILL_FACTOR: f64 = 0.75;
/// Smallest table size.
const MIN_CAPACITY: usize = 8;

/// Fibonacci hashing multiplier (2^64 / phi).
const PHI: u64 = 0x9E37_79B9_7F4A_7C15;

/// Open-addressed `u64 -> i64` map with add-with-increment.
#[derive(Debug, Clone)]
pub struct SparseIntMap {
    keys: Vec<u64>,
    values: Vec<i64>,
    /// Whether the real key 0 is present
    has_zero_key: bool,
    /// Value of the real key 0
    zero_value: i64,
    /// Entries in the arrays (key 0 excluded)
    size: usize,
    mask: usize,
    threshold: usize,
    no_value: i64,
}

impl Default for SparseIntMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseIntMap {
    /// Create an empty map with a small initial table.
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Create a map sized to hold `expected` entries without resizing.
    pub fn with_capacity(expected: usize) -> Self {
        let wanted = ((expected as f64) / DEFAULT_FILL_FACTOR).ceil() as usize + 1;
        let capacity = wanted.max(MIN_CAPACITY).next_power_of_two();
        SparseIntMap {
            keys: vec![FREE_KEY; capacity],
            values: vec![0; capacity],
            has_zero_key: false,
            zero_value: 0,
            size: 0,
            mask: capacity - 1,
            threshold: threshold_for(capacity),
            no_value: DEFAULT_NO_VALUE,
        }
    }

    /// Use `no_value` as the sentinel returned for absent keys.
    pub fn with_no_value(mut self, no_value: i64) -> Self {
        self.no_value = no_value;
        self
    }

    /// Sentinel returned for absent keys.
    pub fn no_value(&self) -> i64 {
        self.no_value
    }

    /// Number of distinct present keys, key 0 included.
    pub fn len(&self) -> usize {
        self.size + usize::from(self.has_zero_key)
    }

    /// True when no key is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current table size in slots.
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Value for `key`, or the configured no-value sentinel.
    pub fn get(&self, key: u64) -> i64 {
        if key == FREE_KEY {
            return if self.has_zero_key {
                self.zero_value
            } else {
                self.no_value
            };
        }
        match self.find(key) {
            Some(slot) => self.values[slot],
            None => self.no_value,
        }
    }

    /// Check whether `key` is present.
    pub fn contains_key(&self, key: u64) -> bool {
        if key == FREE_KEY {
            return self.has_zero_key;
        }
        self.find(key).is_some()
    }

    /// Set `key` to `value`, returning the previous value or the sentinel.
    pub fn put(&mut self, key: u64, value: i64) -> i64 {
        if key == FREE_KEY {
            let previous = if self.has_zero_key {
                self.zero_value
            } else {
                self.no_value
            };
            self.has_zero_key = true;
            self.zero_value = value;
            return previous;
        }
        let slot = self.find_slot(key);
        if self.keys[slot] == key {
            return std::mem::replace(&mut self.values[slot], value);
        }
        self.keys[slot] = key;
        self.values[slot] = value;
        self.grow_after_insert();
        self.no_value
    }

    /// Add `delta` to `key`, inserting `delta` when absent. Returns the new value.
    pub fn add(&mut self, key: u64, delta: i64) -> i64 {
        if key == FREE_KEY {
            if self.has_zero_key {
                self.zero_value += delta;
            } else {
                self.has_zero_key = true;
                self.zero_value = delta;
            }
            return self.zero_value;
        }
        let slot = self.find_slot(key);
        if self.keys[slot] == key {
            self.values[slot] += delta;
            return self.values[slot];
        }
        self.keys[slot] = key;
        self.values[slot] = delta;
        self.grow_after_insert();
        delta
    }

    /// Increment `key` by one.
    #[inline]
    pub fn inc(&mut self, key: u64) -> i64 {
        self.add(key, 1)
    }

    /// Remove `key`, returning its value or the sentinel.
    pub fn remove(&mut self, key: u64) -> i64 {
        if key == FREE_KEY {
            if !self.has_zero_key {
                return self.no_value;
            }
            self.has_zero_key = false;
            return std::mem::take(&mut self.zero_value);
        }
        let Some(slot) = self.find(key) else {
            return self.no_value;
        };
        let value = self.values[slot];
        self.shift_back(slot);
        self.size -= 1;
        value
    }

    /// Remove every entry, keeping the table size.
    pub fn clear(&mut self) {
        self.keys.fill(FREE_KEY);
        self.values.fill(0);
        self.has_zero_key = false;
        self.zero_value = 0;
        self.size = 0;
    }

    /// Iterate `(key, value)` pairs in table order (key 0 first when present).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            map: self,
            slot: 0,
            zero_pending: self.has_zero_key,
        }
    }

    // ------------------------------------------------------------------------
    // Probing
    // ------------------------------------------------------------------------

    #[inline]
    fn ideal_slot(&self, key: u64) -> usize {
        let h = key.wrapping_mul(PHI);
        ((h ^ (h >> 32)) as usize) & self.mask
    }

    /// Slot holding `key`, if present.
    fn find(&self, key: u64) -> Option<usize> {
        let mut slot = self.ideal_slot(key);
        loop {
            let k = self.keys[slot];
            if k == key {
                return Some(slot);
            }
            if k == FREE_KEY {
                return None;
            }
            slot = (slot + 1) & self.mask;
        }
    }

    /// Slot holding `key`, or the free slot where it would be inserted.
    fn find_slot(&self, key: u64) -> usize {
        let mut slot = self.ideal_slot(key);
        loop {
            let k = self.keys[slot];
            if k == key || k == FREE_KEY {
                return slot;
            }
            slot = (slot + 1) & self.mask;
        }
    }

    fn grow_after_insert(&mut self) {
        self.size += 1;
        if self.size >= self.threshold {
            let capacity = self.keys.len().saturating_mul(2);
            self.rehash(capacity);
        }
    }

    fn rehash(&mut self, capacity: usize) {
        let old_keys = std::mem::replace(&mut self.keys, vec![FREE_KEY; capacity]);
        let old_values = std::mem::replace(&mut self.values, vec![0; capacity]);
        self.mask = capacity - 1;
        self.threshold = threshold_for(capacity);
        for (key, value) in old_keys.into_iter().zip(old_values) {
            if key == FREE_KEY {
                continue;
            }
            let slot = self.find_slot(key);
            self.keys[slot] = key;
            self.values[slot] = value;
        }
    }

    /// Backward-shift deletion starting at `slot`.
    fn shift_back(&mut self, mut slot: usize) {
        loop {
            let mut next = (slot + 1) & self.mask;
            loop {
                let key = self.keys[next];
                if key == FREE_KEY {
                    self.keys[slot] = FREE_KEY;
                    self.values[slot] = 0;
                    return;
                }
                let ideal = self.ideal_slot(key);
                // entry at `next` may stay only if its ideal slot lies in (slot, next]
                let stays = if slot <= next {
                    slot < ideal && ideal <= next
                } else {
                    slot < ideal || ideal <= next
                };
                if !stays {
                    self.keys[slot] = key;
                    self.values[slot] = self.values[next];
                    slot = next;
                    break;
                }
                next = (next + 1) & self.mask;
            }
        }
    }
}

fn threshold_for(capacity: usize) -> usize {
    ((capacity as f64) * DEFAULT_FILL_FACTOR) as usize
}

/// Iterator over the entries of a [`SparseIntMap`].
pub struct Iter<'a> {
    map: &'a SparseIntMap,
    slot: usize,
    zero_pending: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (u64, i64);

    fn next(&mut self) -> Option<(u64, i64)> {
        if self.zero_pending {
            self.zero_pending = false;
            return Some((FREE_KEY, self.map.zero_value));
        }
        while self.slot < self.map.keys.len() {
            let slot = self.slot;
            self.slot += 1;
            let key = self.map.keys[slot];
            if key != FREE_KEY {
                return Some((key, self.map.values[slot]));
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a SparseIntMap {
    type Item = (u64, i64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
