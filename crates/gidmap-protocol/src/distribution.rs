//! Distribution descriptor for globally consecutive identifiers
//!
//! `boundaries[r]` is the first identifier owned by rank `r` and the trailing
//! entry is the sentinel `global_max + 1`. Any rank can answer "who owns this
//! identifier" from the descriptor alone.

use gidmap_core::{GidError, Identifier, Result};

/// Per-rank boundaries of a globally consecutive identifier range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionDescriptor<T> {
    boundaries: Vec<T>,
    /// Ordinal values of `boundaries`, for lookups
    keys: Vec<i128>,
}

impl<T: Identifier> DistributionDescriptor<T> {
    /// Build from `num_ranks + 1` non-decreasing boundaries
    pub fn new(boundaries: Vec<T>) -> Result<Self> {
        if boundaries.len() < 2 {
            return Err(GidError::invalid_operation(
                T::type_name(),
                format!("distribution with {} boundaries", boundaries.len()),
            ));
        }
        let keys = boundaries
            .iter()
            .map(T::ordinal_value)
            .collect::<Result<Vec<_>>>()?;
        if keys.windows(2).any(|w| w[1] < w[0]) {
            return Err(GidError::invalid_operation(
                T::type_name(),
                "distribution with decreasing boundaries",
            ));
        }
        Ok(Self { boundaries, keys })
    }

    /// Number of ranks described
    pub fn num_ranks(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// First identifier owned by `rank`
    pub fn first_of(&self, rank: usize) -> Option<&T> {
        if rank < self.num_ranks() {
            self.boundaries.get(rank)
        } else {
            None
        }
    }

    /// One past the global maximum
    pub fn sentinel(&self) -> &T {
        &self.boundaries[self.num_ranks()]
    }

    /// Number of identifiers owned by `rank`
    pub fn local_len(&self, rank: usize) -> Option<u64> {
        if rank >= self.num_ranks() {
            return None;
        }
        u64::try_from(self.keys[rank + 1] - self.keys[rank]).ok()
    }

    /// Total number of identifiers
    pub fn global_len(&self) -> u64 {
        u64::try_from(self.keys[self.num_ranks()] - self.keys[0]).unwrap_or(0)
    }

    /// Rank owning `value`, or `None` outside `[boundaries[0], sentinel)`
    pub fn owner_of(&self, value: &T) -> Result<Option<usize>> {
        let v = value.ordinal_value()?;
        let sentinel = self.keys[self.num_ranks()];
        if v < self.keys[0] || v >= sentinel {
            return Ok(None);
        }
        // last rank whose first value is <= v
        let owner = self.keys[..self.num_ranks()].partition_point(|&k| k <= v) - 1;
        Ok(Some(owner))
    }

    /// Boundaries as a slice of `num_ranks + 1` values
    pub fn as_slice(&self) -> &[T] {
        &self.boundaries
    }

    /// Take ownership of the boundaries
    pub fn into_vec(self) -> Vec<T> {
        self.boundaries
    }
}
