//! Collective communication effect trait
//!
//! Pure interface to the message-passing layer that connects the ranks of a
//! process group. Implementations live in `gidmap-effects`; MPI-style bindings
//! can implement the same trait.
//!
//! Every method is group-synchronous: all ranks must call the same collectives
//! in the same order, exactly once. Handlers must not retry internally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pure, commutative and associative combiner for opaque reduction buffers.
///
/// Called as `op(accumulated, incoming)` and returns the combined buffer.
pub type ReduceFn = dyn Fn(&[u8], &[u8]) -> Result<Vec<u8>, CollectiveError> + Send + Sync;

/// Collective primitives, used to label calls in stats, logs and faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollectiveOp {
    /// Reduction whose result is delivered to every rank
    ReduceAll,
    /// Personalised exchange, one block per destination rank
    AllToAll,
}

impl CollectiveOp {
    /// Stable name used in errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReduceAll => "reduce_all",
            Self::AllToAll => "all_to_all",
        }
    }
}

impl fmt::Display for CollectiveOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in element-wise reduction operators over `u64` lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceOp {
    /// Saturating sum
    Sum,
    /// Minimum
    Min,
    /// Maximum
    Max,
    /// Logical AND over {0, 1} flags (minimum of normalised flags)
    LogicalAnd,
}

impl ReduceOp {
    /// Combine two lanes
    pub fn apply(&self, a: u64, b: u64) -> u64 {
        match self {
            Self::Sum => a.saturating_add(b),
            Self::Min => a.min(b),
            Self::Max => a.max(b),
            Self::LogicalAnd => u64::from(a != 0).min(u64::from(b != 0)),
        }
    }
}

/// Errors reported by the communication layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum CollectiveError {
    /// The collective could not be completed
    #[error("{operation} failed: {reason}")]
    OperationFailed {
        /// Collective that failed
        operation: String,
        /// Reason for the failure
        reason: String,
    },
    /// A rank contributed a buffer of unexpected length
    #[error("Buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferMismatch {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },
    /// The group has been torn down
    #[error("Process group closed")]
    GroupClosed,
}

impl CollectiveError {
    /// Create an operation failure for the given collective
    pub fn failed(operation: CollectiveOp, reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.as_str().to_string(),
            reason: reason.into(),
        }
    }
}

/// Collective effects for a process group
#[async_trait]
pub trait CollectiveEffects: Send + Sync {
    /// Rank of the calling process, in `[0, size)`
    fn rank(&self) -> usize;

    /// Number of processes in the group, identical on every rank
    fn size(&self) -> usize;

    /// Reduce one buffer per rank with `op`; every rank receives the result.
    async fn reduce_all_with(
        &self,
        send: Vec<u8>,
        op: &ReduceFn,
    ) -> Result<Vec<u8>, CollectiveError>;

    /// Personalised exchange.
    ///
    /// `send` holds `size()` blocks of `bytes_per_rank` bytes; block `r` goes to
    /// rank `r`. The result holds one block from each rank, in rank order.
    async fn all_to_all(
        &self,
        send: Vec<u8>,
        bytes_per_rank: usize,
    ) -> Result<Vec<u8>, CollectiveError>;

    /// Element-wise reduction of `u64` lanes with a built-in operator
    async fn reduce_all_u64(
        &self,
        op: ReduceOp,
        values: &[u64],
    ) -> Result<Vec<u64>, CollectiveError> {
        let combine = move |acc: &[u8], incoming: &[u8]| -> Result<Vec<u8>, CollectiveError> {
            let left = decode_u64_lanes(acc)?;
            let right = decode_u64_lanes(incoming)?;
            if left.len() != right.len() {
                return Err(CollectiveError::BufferMismatch {
                    expected: acc.len(),
                    actual: incoming.len(),
                });
            }
            let combined: Vec<u64> = left
                .iter()
                .zip(&right)
                .map(|(a, b)| op.apply(*a, *b))
                .collect();
            Ok(encode_u64_lanes(&combined))
        };

        let reduced = self
            .reduce_all_with(encode_u64_lanes(values), &combine)
            .await?;
        decode_u64_lanes(&reduced)
    }
}

/// Encode `u64` lanes as little-endian bytes
pub fn encode_u64_lanes(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode little-endian `u64` lanes
pub fn decode_u64_lanes(bytes: &[u8]) -> Result<Vec<u64>, CollectiveError> {
    const LANE: usize = std::mem::size_of::<u64>();
    if bytes.len() % LANE != 0 {
        return Err(CollectiveError::BufferMismatch {
            expected: bytes.len() - bytes.len() % LANE,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(LANE)
        .map(|chunk| {
            let mut lane = [0u8; LANE];
            lane.copy_from_slice(chunk);
            u64::from_le_bytes(lane)
        })
        .collect())
}
