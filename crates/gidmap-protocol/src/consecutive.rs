//! Global consecutiveness decision
//!
//! Decides whether the union of every rank's identifier shard is one
//! consecutive integer range laid out in rank order, without gathering the
//! identifiers anywhere. Communication is at most:
//!
//! 1. one sum of shard lengths (always, so the caller learns `global_len`)
//! 2. one min/max reduction (ordinal types only)
//! 3. one logical AND of local consecutiveness (multi-rank, pigeonhole holds)
//! 4. one all-to-all of each rank's `[first, last]` (every rank passed step 3)
//!
//! The runs must tile `[global_min, global_max]` in rank order: every
//! non-empty run starts exactly one past the previous non-empty run's last
//! value. Comparing run starts alone would accept overlapping runs that
//! leave a gap elsewhere.
//!
//! Every rank takes the same branch at every step because each branch depends
//! only on the identifier type, the group size, the configuration, or the
//! result of a collective that all ranks share. That keeps the collective
//! sequence identical across the group.

use crate::distribution::DistributionDescriptor;
use gidmap_core::effects::{CollectiveEffects, ReduceOp};
use gidmap_core::{
    DecisionConfig, EmptyShardPolicy, GidError, Identifier, IdentifierTypeInfo, Result,
};

/// What the decision learned about the global identifier layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdLayout<T> {
    /// Nothing beyond the count is known: the identifier type is not
    /// ordinal, or the group holds no identifiers at all
    Unordered,
    /// Ordinal but not globally consecutive; inclusive global bounds
    Range {
        /// Global minimum
        min: T,
        /// Global maximum
        max: T,
    },
    /// Globally consecutive and laid out in rank order
    Consecutive(DistributionDescriptor<T>),
}

/// Result of one decision call, identical on every rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsecutiveDecision<T> {
    /// Sum of all shard lengths
    pub global_len: u64,
    /// Layout information
    pub layout: IdLayout<T>,
}

impl<T: Identifier> ConsecutiveDecision<T> {
    /// Whether the identifiers are globally consecutive
    pub fn is_consecutive(&self) -> bool {
        matches!(self.layout, IdLayout::Consecutive(_))
    }

    /// The distribution descriptor, when consecutive
    pub fn descriptor(&self) -> Option<&DistributionDescriptor<T>> {
        match &self.layout {
            IdLayout::Consecutive(dist) => Some(dist),
            _ => None,
        }
    }

    /// Inclusive global bounds, when ordinal but not consecutive
    pub fn range(&self) -> Option<(&T, &T)> {
        match &self.layout {
            IdLayout::Range { min, max } => Some((min, max)),
            _ => None,
        }
    }

    /// Flat buffer: `[min, max]`, the `num_ranks + 1` boundaries, or empty
    pub fn range_buffer(&self) -> Vec<T> {
        match &self.layout {
            IdLayout::Unordered => Vec::new(),
            IdLayout::Range { min, max } => vec![min.clone(), max.clone()],
            IdLayout::Consecutive(dist) => dist.as_slice().to_vec(),
        }
    }
}

/// Handler running the decision protocol with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct ConsecutivenessProtocol {
    config: DecisionConfig,
}

impl ConsecutivenessProtocol {
    /// Create a protocol handler
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    /// The decision configuration
    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Run the decision for this rank's shard. Collective: every rank of
    /// `comm` must call it with the same `T` and configuration.
    pub async fn decide<T, C>(&self, comm: &C, values: &[T]) -> Result<ConsecutiveDecision<T>>
    where
        T: Identifier,
        C: CollectiveEffects + ?Sized,
    {
        let rank = comm.rank();
        let nprocs = comm.size();
        let info = IdentifierTypeInfo::of::<T>();

        if !info.is_valid {
            return Err(GidError::unsupported(info.type_name));
        }

        if nprocs == 0 {
            if !values.is_empty() {
                tracing::warn!(
                    len = values.len(),
                    "Identifiers supplied outside any process group; ignoring them"
                );
            }
            return Ok(ConsecutiveDecision {
                global_len: 0,
                layout: IdLayout::Unordered,
            });
        }

        // The failing rank enters no collective at all; its peers still wait
        // in the first reduction, so every rank must hold the same policy
        if info.is_ordinal
            && values.is_empty()
            && self.config.empty_shards == EmptyShardPolicy::Reject
        {
            tracing::warn!(rank, type_name = %info.type_name, "Empty shard entered decision");
            return Err(GidError::empty_shard(rank));
        }

        let global_len = single_lane(
            comm.reduce_all_u64(ReduceOp::Sum, &[values.len() as u64])
                .await?,
        )?;

        if !info.is_ordinal {
            tracing::debug!(rank, global_len, identifier = %info, "Identifier type is not ordinal");
            return Ok(ConsecutiveDecision {
                global_len,
                layout: IdLayout::Unordered,
            });
        }

        if global_len == 0 {
            tracing::debug!(rank, "No identifiers anywhere in the group");
            return Ok(ConsecutiveDecision {
                global_len,
                layout: IdLayout::Unordered,
            });
        }

        // An empty shard yields the inverted (MAX, MIN) pair, neutral for min/max
        let (local_min, local_max) = T::local_min_max(values)?;
        let (global_min, global_max) = T::global_min_max(comm, &local_min, &local_max).await?;
        let g_min = global_min.ordinal_value()?;
        let g_max = global_max.ordinal_value()?;

        let not_consecutive = |reason: &str| {
            tracing::debug!(rank, global_len, g_min, g_max, reason, "Identifiers not globally consecutive");
            ConsecutiveDecision {
                global_len,
                layout: IdLayout::Range {
                    min: global_min.clone(),
                    max: global_max.clone(),
                },
            }
        };

        // A consecutive range of global_len values spans exactly global_len
        if g_max - g_min + 1 != i128::from(global_len) {
            return Ok(not_consecutive("span differs from global length"));
        }

        let locally_consecutive = T::are_consecutive(values)?;

        if nprocs == 1 {
            if !locally_consecutive {
                return Ok(not_consecutive("shard is not consecutive"));
            }
            let boundaries = vec![local_min.clone(), T::from_ordinal_value(g_max + 1)?];
            return consecutive(rank, global_len, boundaries);
        }

        let all_consecutive = single_lane(
            comm.reduce_all_u64(ReduceOp::LogicalAnd, &[u64::from(locally_consecutive)])
                .await?,
        )?;
        if all_consecutive == 0 {
            return Ok(not_consecutive("some shard is not consecutive"));
        }

        // Every shard passed the local check, so its min and max are its first
        // and last values
        let runs = exchange_runs(comm, &local_min, &local_max).await?;

        let Some(starts) = rank_starts(&runs, g_min) else {
            return Ok(not_consecutive("rank runs do not tile the range in rank order"));
        };

        let mut boundaries = starts
            .into_iter()
            .map(T::from_ordinal_value)
            .collect::<Result<Vec<_>>>()?;
        boundaries.push(T::from_ordinal_value(g_max + 1)?);
        consecutive(rank, global_len, boundaries)
    }
}

/// Decide with the default configuration
pub async fn globally_consecutive_ordinals<T, C>(
    comm: &C,
    values: &[T],
) -> Result<ConsecutiveDecision<T>>
where
    T: Identifier,
    C: CollectiveEffects + ?Sized,
{
    ConsecutivenessProtocol::default().decide(comm, values).await
}

/// Decide with an explicit configuration
pub async fn globally_consecutive_ordinals_with<T, C>(
    comm: &C,
    values: &[T],
    config: &DecisionConfig,
) -> Result<ConsecutiveDecision<T>>
where
    T: Identifier,
    C: CollectiveEffects + ?Sized,
{
    ConsecutivenessProtocol::new(config.clone())
        .decide(comm, values)
        .await
}

/// Send this rank's `[first, last]` to every rank; returns all runs in rank order.
/// An empty shard sends its inverted `(MAX, MIN)` pair, so `first > last`.
async fn exchange_runs<T, C>(comm: &C, first: &T, last: &T) -> Result<Vec<(i128, i128)>>
where
    T: Identifier,
    C: CollectiveEffects + ?Sized,
{
    let block = bincode::serialize(&(first, last))?;
    let bytes_per_rank = block.len();
    let received = comm
        .all_to_all(block.repeat(comm.size()), bytes_per_rank)
        .await?;

    if received.len() != bytes_per_rank * comm.size() {
        return Err(GidError::collective(
            "all_to_all",
            format!(
                "received {} bytes, expected {}",
                received.len(),
                bytes_per_rank * comm.size()
            ),
        ));
    }

    received
        .chunks_exact(bytes_per_rank)
        .map(|chunk| {
            let (first, last): (T, T) = bincode::deserialize(chunk)?;
            Ok((first.ordinal_value()?, last.ordinal_value()?))
        })
        .collect()
}

/// First value owned by each rank, or `None` unless the non-empty runs tile
/// one range starting at `global_min` in rank order. Empty runs own nothing
/// and start where the next run begins.
fn rank_starts(runs: &[(i128, i128)], global_min: i128) -> Option<Vec<i128>> {
    let mut next = global_min;
    let mut starts = Vec::with_capacity(runs.len());
    for &(first, last) in runs {
        if first > last {
            starts.push(next);
            continue;
        }
        if first != next {
            return None;
        }
        starts.push(first);
        next = last + 1;
    }
    Some(starts)
}

fn consecutive<T: Identifier>(
    rank: usize,
    global_len: u64,
    boundaries: Vec<T>,
) -> Result<ConsecutiveDecision<T>> {
    let dist = DistributionDescriptor::new(boundaries)?;
    tracing::debug!(
        rank,
        global_len,
        num_ranks = dist.num_ranks(),
        "Identifiers globally consecutive"
    );
    Ok(ConsecutiveDecision {
        global_len,
        layout: IdLayout::Consecutive(dist),
    })
}

fn single_lane(lanes: Vec<u64>) -> Result<u64> {
    match lanes.as_slice() {
        [value] => Ok(*value),
        other => Err(GidError::collective(
            "reduce_all",
            format!("expected 1 lane, received {}", other.len()),
        )),
    }
}
