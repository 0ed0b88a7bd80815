//! Lossless packing of two 32-bit integers into one 64-bit key
//!
//! Used wherever counting state is indexed by a pair (term × term edges),
//! so the pair can live in a [`crate::SparseIntMap`] without boxing.
//!
//! Layout: low 32 bits hold `a`, high 32 bits hold `b`. Signed values
//! round-trip through their bit pattern, never through their magnitude.

/// A pair of 32-bit integers packed into a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(u64);

impl PairKey {
    /// Pack `(a, b)` as `(a & 0xFFFF_FFFF) | (b << 32)`.
    #[inline]
    pub const fn pack(a: i32, b: i32) -> u64 {
        (a as u32 as u64) | ((b as u32 as u64) << 32)
    }

    /// Recover the pair packed by [`PairKey::pack`].
    #[inline]
    pub const fn unpack(key: u64) -> (i32, i32) {
        (key as u32 as i32, (key >> 32) as u32 as i32)
    }

    /// Build a key from two unsigned ids (term ids, doc ids).
    #[inline]
    pub const fn from_ids(a: u32, b: u32) -> Self {
        PairKey((a as u64) | ((b as u64) << 32))
    }

    /// Build a key from a signed pair.
    #[inline]
    pub const fn new(a: i32, b: i32) -> Self {
        PairKey(Self::pack(a, b))
    }

    /// Wrap an already packed value.
    #[inline]
    pub const fn from_u64(key: u64) -> Self {
        PairKey(key)
    }

    /// Packed value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Low half as an unsigned id.
    #[inline]
    pub const fn first(self) -> u32 {
        self.0 as u32
    }

    /// High half as an unsigned id.
    #[inline]
    pub const fn second(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl From<PairKey> for u64 {
    fn from(key: PairKey) -> u64 {
        key.0
    }
}
