//! Pair identifiers, e.g. `(row, column)` of a matrix nonzero

use super::{ensure_valid, sealed, Identifier, Ordinal};
use crate::errors::{GidError, Result};
use crate::primitives::normalize_hash;

/// Bits reserved for each component of a packed pair key
pub const PAIR_HALF_BITS: u32 = 32;

/// Widest pair, in bytes, that gidmap accepts
const MAX_PAIR_WIDTH: usize = 8;

/// Pack two component bit patterns into one 64-bit key.
///
/// Layout: `first` occupies bits 32..64 and `second` bits 0..32. Each
/// component must already be zero-extended from a width of at most 32 bits.
/// Returns `None` when either component does not fit its half.
pub fn pack_pair_key(first: u64, second: u64) -> Option<u64> {
    let half_mask = (1u64 << PAIR_HALF_BITS) - 1;
    if first > half_mask || second > half_mask {
        return None;
    }
    Some((first << PAIR_HALF_BITS) | second)
}

impl<A: Ordinal, B: Ordinal> sealed::Sealed for (A, B) {}

/// Pairs of ordinals: hashable, keyed when both halves fit 32 bits, never ordered.
impl<A: Ordinal, B: Ordinal> Identifier for (A, B) {
    fn type_name() -> String {
        format!("({}, {})", A::type_name(), B::type_name())
    }

    fn byte_width() -> Option<usize> {
        Some(A::WIDTH + B::WIDTH)
    }

    fn is_valid_identifier_type() -> bool {
        A::WIDTH + B::WIDTH <= MAX_PAIR_WIDTH
    }

    fn is_ordinal() -> bool {
        false
    }

    fn has_unique_key() -> bool {
        let half_bytes = (PAIR_HALF_BITS / 8) as usize;
        Self::is_valid_identifier_type() && A::WIDTH <= half_bytes && B::WIDTH <= half_bytes
    }

    fn hash_code(&self) -> Result<i32> {
        ensure_valid::<Self>()?;
        Ok(normalize_hash(
            self.0.ordinal_hash().wrapping_add(self.1.ordinal_hash()),
        ))
    }

    /// Packed key reinterpreted as `f64` bits; equality only holds on `to_bits()`
    fn key(&self) -> Result<f64> {
        self.packed_key().map(f64::from_bits)
    }

    fn stringify(&self) -> Result<String> {
        ensure_valid::<Self>()?;
        Ok(format!(
            "pair<{},{}>({},{})",
            A::type_name(),
            B::type_name(),
            self.0,
            self.1
        ))
    }

    fn difference(_a: &Self, _b: &Self) -> Result<Self> {
        Err(Self::reject("difference"))
    }

    fn ordinal_value(&self) -> Result<i128> {
        Err(Self::reject("ordinal_value"))
    }

    fn from_ordinal_value(_value: i128) -> Result<Self> {
        Err(Self::reject("from_ordinal_value"))
    }

    fn local_min_max(_values: &[Self]) -> Result<(Self, Self)> {
        Err(Self::reject("local_min_max"))
    }

    fn are_consecutive(_values: &[Self]) -> Result<bool> {
        Err(Self::reject("are_consecutive"))
    }
}

/// Pair-only helpers
pub trait PairKey {
    /// The packed 64-bit key: first component high, second low
    fn packed_key(&self) -> Result<u64>;
}

impl<A: Ordinal, B: Ordinal> PairKey for (A, B) {
    fn packed_key(&self) -> Result<u64> {
        ensure_valid::<Self>()?;
        if !Self::has_unique_key() {
            return Err(GidError::invalid_operation(Self::type_name(), "key"));
        }
        pack_pair_key(self.0.raw_bits(), self.1.raw_bits())
            .ok_or_else(|| GidError::invalid_operation(Self::type_name(), "key"))
    }
}

trait Reject {
    fn reject(operation: &str) -> GidError;
}

impl<A: Ordinal, B: Ordinal> Reject for (A, B) {
    /// Unsupported shapes win over missing capabilities
    fn reject(operation: &str) -> GidError {
        match ensure_valid::<Self>() {
            Err(err) => err,
            Ok(()) => GidError::invalid_operation(Self::type_name(), operation),
        }
    }
}
