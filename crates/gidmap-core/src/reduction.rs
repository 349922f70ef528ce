//! Distributed min/max reduction
//!
//! Identifier types are not native reduction types of the communication
//! layer, so the local `(min, max)` pair travels as an opaque bincode buffer
//! and is combined by [`MinMaxReduction`]: first element by minimum, second
//! element by maximum, never mixed.

use crate::effects::{CollectiveEffects, CollectiveError, CollectiveOp};
use crate::errors::{GidError, Result};
use crate::identifier::{ensure_ordinal, Identifier};
use std::marker::PhantomData;

/// Stateless `(min, max)` combiner for identifier type `T`
#[derive(Debug, Clone, Copy)]
pub struct MinMaxReduction<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Identifier> Default for MinMaxReduction<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identifier> MinMaxReduction<T> {
    /// Create the operator
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Encode a `(min, max)` pair as a reduction buffer
    pub fn encode(min: &T, max: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&(min, max))?)
    }

    /// Decode a reduction buffer
    pub fn decode(bytes: &[u8]) -> Result<(T, T)> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Combine two buffers: element-wise min of firsts, max of seconds
    pub fn combine(
        &self,
        acc: &[u8],
        incoming: &[u8],
    ) -> std::result::Result<Vec<u8>, CollectiveError> {
        let fail =
            |e: GidError| CollectiveError::failed(CollectiveOp::ReduceAll, e.to_string());

        let (acc_min, acc_max) = Self::decode(acc).map_err(fail)?;
        let (in_min, in_max) = Self::decode(incoming).map_err(fail)?;

        let min = if in_min.ordinal_value().map_err(fail)? < acc_min.ordinal_value().map_err(fail)?
        {
            in_min
        } else {
            acc_min
        };
        let max = if in_max.ordinal_value().map_err(fail)? > acc_max.ordinal_value().map_err(fail)?
        {
            in_max
        } else {
            acc_max
        };

        Self::encode(&min, &max).map_err(fail)
    }
}

/// Global `(min, max)` across every rank of `comm`.
///
/// A group of one returns the local pair without communicating. Every other
/// group size issues exactly one reduction.
pub async fn global_min_max<T, C>(comm: &C, local_min: &T, local_max: &T) -> Result<(T, T)>
where
    T: Identifier,
    C: CollectiveEffects + ?Sized,
{
    ensure_ordinal::<T>("global_min_max")?;

    if comm.size() <= 1 {
        return Ok((local_min.clone(), local_max.clone()));
    }

    let reduction = MinMaxReduction::<T>::new();
    let send = MinMaxReduction::<T>::encode(local_min, local_max)?;
    let op = move |acc: &[u8], incoming: &[u8]| reduction.combine(acc, incoming);

    let reduced = comm.reduce_all_with(send, &op).await?;
    let (global_min, global_max) = MinMaxReduction::<T>::decode(&reduced)?;

    tracing::trace!(
        rank = comm.rank(),
        type_name = %T::type_name(),
        global_min = ?global_min,
        global_max = ?global_max,
        "Reduced global min/max"
    );

    Ok((global_min, global_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_keeps_min_and_max_apart() {
        let op = MinMaxReduction::<i32>::new();
        let a = MinMaxReduction::<i32>::encode(&5, &9).unwrap();
        let b = MinMaxReduction::<i32>::encode(&-3, &7).unwrap();

        let combined = op.combine(&a, &b).unwrap();
        assert_eq!(MinMaxReduction::<i32>::decode(&combined).unwrap(), (-3, 9));
    }

    #[test]
    fn test_combine_is_commutative() {
        let op = MinMaxReduction::<u64>::new();
        let a = MinMaxReduction::encode(&10u64, &20u64).unwrap();
        let b = MinMaxReduction::encode(&0u64, &15u64).unwrap();

        assert_eq!(op.combine(&a, &b).unwrap(), op.combine(&b, &a).unwrap());
    }

    #[test]
    fn test_combine_rejects_garbage() {
        let op = MinMaxReduction::<u32>::new();
        let a = MinMaxReduction::encode(&1u32, &2u32).unwrap();
        let err = op.combine(&a, &[1, 2]).unwrap_err();
        assert!(matches!(err, CollectiveError::OperationFailed { .. }));
    }
}
