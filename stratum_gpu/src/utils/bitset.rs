/// Fixed 64-bit set used for per-binding dirty/valid tracking

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Set of indices in `0..64` packed into a single word
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitset64(u64);

impl Bitset64 {
    pub const CAPACITY: usize = 64;

    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn set(&mut self, index: usize) {
        debug_assert!(index < Self::CAPACITY);
        self.0 |= 1u64 << index;
    }

    pub fn unset(&mut self, index: usize) {
        debug_assert!(index < Self::CAPACITY);
        self.0 &= !(1u64 << index);
    }

    pub fn set_value(&mut self, index: usize, value: bool) {
        if value {
            self.set(index);
        } else {
            self.unset(index);
        }
    }

    /// Out-of-range indices read as unset
    pub fn test(self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1u64 << index) != 0
    }

    pub const fn any(self) -> bool {
        self.0 != 0
    }

    pub const fn none(self) -> bool {
        self.0 == 0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Set indices in ascending order
    pub fn iter(self) -> Bitset64Iter {
        Bitset64Iter(self.0)
    }
}

impl fmt::Debug for Bitset64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOr for Bitset64 {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Bitset64 {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Bitset64 {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl FromIterator<usize> for Bitset64 {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        for index in iter {
            set.set(index);
        }
        set
    }
}

/// Iterator over set indices, lowest first
pub struct Bitset64Iter(u64);

impl Iterator for Bitset64Iter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(index)
    }
}

#[cfg(test)]
#[path = "bitset_tests.rs"]
mod tests;
