use bitvec::prelude::*;
use std::fmt;

/// Fixed-size bitset over the value domain of a grid
///
/// Uses 1-based indexing to match cell values throughout the system.
/// Provides O(1) membership testing and efficient set operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueSet {
    bits: BitVec,
    max_value: usize,
}

impl ValueSet {
    /// Create a set with no values present
    pub fn new(max_value: usize) -> Self {
        Self {
            bits: bitvec![0; max_value],
            max_value,
        }
    }

    /// Create a set containing every value of the domain
    pub fn all(max_value: usize) -> Self {
        Self {
            bits: bitvec![1; max_value],
            max_value,
        }
    }

    /// Insert a value
    ///
    /// Takes 1-based values, storing at value-1 internally
    pub fn insert(&mut self, value: u8) {
        let value = usize::from(value);
        if value > 0 && value <= self.max_value {
            self.bits.set(value - 1, true);
        }
    }

    /// Remove a value
    pub fn remove(&mut self, value: u8) {
        let value = usize::from(value);
        if value > 0 && value <= self.max_value {
            self.bits.set(value - 1, false);
        }
    }

    /// Test value membership
    pub fn contains(&self, value: u8) -> bool {
        let value = usize::from(value);
        if value > 0 {
            self.bits.get(value - 1).as_deref() == Some(&true)
        } else {
            false
        }
    }

    /// Intersect this set with another in-place
    pub fn intersect_with(&mut self, other: &Self) {
        self.bits &= &other.bits;
    }

    /// Test if no values are present
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Count values in the set
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// The only value in the set, if it holds exactly one
    pub fn single(&self) -> Option<u8> {
        if self.count() == 1 {
            self.bits.first_one().map(|index| (index + 1) as u8)
        } else {
            None
        }
    }

    /// Extract all values in ascending order
    pub fn to_vec(&self) -> Vec<u8> {
        self.bits.iter_ones().map(|index| (index + 1) as u8).collect()
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueSet({} values: {:?})", self.count(), self.to_vec())
    }
}
