//! Fixed-width integer identifiers

use super::{sealed, Identifier};
use crate::errors::{GidError, Result};
use crate::primitives::{byte_fold_hash, is_locally_consecutive, local_min_max, normalize_hash};
use std::fmt;

/// Widest integer that still converts to `f64` without loss
const MAX_EXACT_KEY_WIDTH: usize = 4;

/// Integer identifier kinds with a native total order
pub trait Ordinal:
    Identifier + Copy + Ord + fmt::Display + sealed::Sealed
{
    /// Smallest value
    const MIN: Self;
    /// Largest value
    const MAX: Self;
    /// Width in bytes
    const WIDTH: usize;

    /// Widen to `i128`
    fn to_i128(self) -> i128;

    /// Narrow from `i128`, `None` when out of range
    fn from_i128(value: i128) -> Option<Self>;

    /// Little-endian bytes of the value
    fn le_bytes(self) -> Vec<u8>;

    /// Two's-complement bit pattern, zero-extended from `WIDTH` bytes
    fn raw_bits(self) -> u64 {
        let bits = self.to_i128() as u64;
        if Self::WIDTH >= 8 {
            bits
        } else {
            bits & ((1u64 << (Self::WIDTH * 8)) - 1)
        }
    }

    /// Identity for types up to 32 bits, byte fold for wider ones
    fn ordinal_hash(self) -> i32 {
        if Self::WIDTH <= 4 {
            normalize_hash(self.to_i128() as i32)
        } else {
            byte_fold_hash(&self.le_bytes())
        }
    }
}

macro_rules! ordinal_identifier {
    ($($t:ty),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Ordinal for $t {
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn to_i128(self) -> i128 {
                i128::from(self)
            }

            fn from_i128(value: i128) -> Option<Self> {
                <$t>::try_from(value).ok()
            }

            fn le_bytes(self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }
        }

        impl Identifier for $t {
            fn type_name() -> String {
                stringify!($t).to_string()
            }

            fn byte_width() -> Option<usize> {
                Some(<$t as Ordinal>::WIDTH)
            }

            fn is_ordinal() -> bool {
                true
            }

            fn has_unique_key() -> bool {
                <$t as Ordinal>::WIDTH <= MAX_EXACT_KEY_WIDTH
            }

            fn hash_code(&self) -> Result<i32> {
                Ok(self.ordinal_hash())
            }

            fn key(&self) -> Result<f64> {
                if <$t as Identifier>::has_unique_key() {
                    Ok(self.to_i128() as f64)
                } else {
                    Err(GidError::invalid_operation(Self::type_name(), "key"))
                }
            }

            fn stringify(&self) -> Result<String> {
                Ok(self.to_string())
            }

            fn difference(a: &Self, b: &Self) -> Result<Self> {
                let diff = b.to_i128() - a.to_i128();
                Self::from_ordinal_value(diff)
            }

            fn ordinal_value(&self) -> Result<i128> {
                Ok(self.to_i128())
            }

            fn from_ordinal_value(value: i128) -> Result<Self> {
                <$t as Ordinal>::from_i128(value)
                    .ok_or_else(|| GidError::range_overflow(Self::type_name(), value))
            }

            fn local_min_max(values: &[Self]) -> Result<(Self, Self)> {
                Ok(local_min_max(values))
            }

            fn are_consecutive(values: &[Self]) -> Result<bool> {
                Ok(is_locally_consecutive(values))
            }
        }
    )*};
}

ordinal_identifier!(i8, i16, i32, i64, u8, u16, u32, u64);
