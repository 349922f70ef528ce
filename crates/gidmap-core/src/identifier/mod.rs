//! Identifier capability traits
//!
//! Every user global identifier type gidmap accepts implements [`Identifier`].
//! The set is closed: the eight fixed-width integers, `String`, and pairs of
//! two integers. Anything else fails to compile rather than being handled by
//! byte reinterpretation at runtime.
//!
//! Capabilities differ per kind. Ordinal-only operations (`difference`,
//! min/max, consecutiveness) and unique-key operations return
//! [`GidError::InvalidOperation`] on kinds that lack them, and pair shapes
//! wider than 8 bytes report `is_valid_identifier_type() == false` and reject
//! every fallible operation with [`GidError::UnsupportedIdentifierType`].

mod ordinal;
mod pair;
mod text;

pub use ordinal::Ordinal;
pub use pair::{pack_pair_key, PairKey, PAIR_HALF_BITS};

use crate::effects::CollectiveEffects;
use crate::errors::{GidError, Result};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// Capability record for a user global identifier type
pub trait Identifier:
    Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static + sealed::Sealed
{
    /// Name of the identifier type
    fn type_name() -> String;

    /// Fixed encoded width in bytes, `None` for variable-length kinds
    fn byte_width() -> Option<usize>;

    /// Whether gidmap accepts this type at all
    fn is_valid_identifier_type() -> bool {
        true
    }

    /// Whether the type has a total order and subtraction
    fn is_ordinal() -> bool;

    /// Whether [`Identifier::key`] yields a lossless, unique key
    fn has_unique_key() -> bool;

    /// Non-negative hash code; collisions are allowed
    fn hash_code(&self) -> Result<i32>;

    /// Unique numeric key, only when [`Identifier::has_unique_key`] holds.
    ///
    /// Integer keys are the exact value. Pair keys carry the packed layout
    /// as an `f64` bit pattern, which may be a NaN: compare them through
    /// [`f64::to_bits`], or use [`PairKey::packed_key`].
    fn key(&self) -> Result<f64>;

    /// Human-readable rendering of the value
    fn stringify(&self) -> Result<String>;

    /// `b - a`, ordinal types only
    fn difference(a: &Self, b: &Self) -> Result<Self>;

    /// The value widened to `i128`, ordinal types only
    fn ordinal_value(&self) -> Result<i128>;

    /// Narrow an `i128` back into the type, ordinal types only
    fn from_ordinal_value(value: i128) -> Result<Self>;

    /// Local `(min, max)`; empty input yields the inverted `(MAX, MIN)` pair
    fn local_min_max(values: &[Self]) -> Result<(Self, Self)>;

    /// Whether `values` are increasing and consecutive
    fn are_consecutive(values: &[Self]) -> Result<bool>;

    /// Global `(min, max)` across the group. Collective: every rank must call it.
    fn global_min_max<'a, C>(
        comm: &'a C,
        local_min: &'a Self,
        local_max: &'a Self,
    ) -> BoxFuture<'a, Result<(Self, Self)>>
    where
        C: CollectiveEffects + ?Sized + 'a,
    {
        Box::pin(crate::reduction::global_min_max(comm, local_min, local_max))
    }
}

/// Fail with `UnsupportedIdentifierType` unless `T` is accepted
pub(crate) fn ensure_valid<T: Identifier>() -> Result<()> {
    if T::is_valid_identifier_type() {
        Ok(())
    } else {
        Err(GidError::unsupported(T::type_name()))
    }
}

/// Fail unless `T` is a valid ordinal identifier type
pub(crate) fn ensure_ordinal<T: Identifier>(operation: &str) -> Result<()> {
    ensure_valid::<T>()?;
    if T::is_ordinal() {
        Ok(())
    } else {
        Err(GidError::invalid_operation(T::type_name(), operation))
    }
}

/// Capability summary of an identifier type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierTypeInfo {
    /// Type name
    pub type_name: String,
    /// Fixed width in bytes, if any
    pub byte_width: Option<usize>,
    /// Ordinal capability
    pub is_ordinal: bool,
    /// Unique key capability
    pub has_unique_key: bool,
    /// Whether the type is accepted
    pub is_valid: bool,
}

impl IdentifierTypeInfo {
    /// Describe `T`
    pub fn of<T: Identifier>() -> Self {
        let is_valid = T::is_valid_identifier_type();
        Self {
            type_name: T::type_name(),
            byte_width: T::byte_width(),
            is_ordinal: is_valid && T::is_ordinal(),
            has_unique_key: is_valid && T::has_unique_key(),
            is_valid,
        }
    }

    /// JSON rendering for diagnostics
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GidError::serialization(e.to_string()))
    }
}

impl fmt::Display for IdentifierTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)?;
        if !self.is_valid {
            return write!(f, " [unsupported]");
        }
        let mut caps = Vec::new();
        if self.is_ordinal {
            caps.push("ordinal");
        }
        if self.has_unique_key {
            caps.push("unique-key");
        }
        if caps.is_empty() {
            Ok(())
        } else {
            write!(f, " [{}]", caps.join(", "))
        }
    }
}
