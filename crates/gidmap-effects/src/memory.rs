//! In-Memory Collective Handler
//!
//! Process group simulated inside one runtime for testing and simulation.
//! Every rank is a handler sharing one slot table; each collective is an
//! all-gather behind a barrier followed by a local, rank-ordered computation,
//! so all ranks derive identical results.
//!
//! Ranks must be driven concurrently (e.g. `join_all` or separate tasks): a
//! collective only completes once every rank of the group has entered it.

use async_trait::async_trait;
use futures::future::join_all;
use gidmap_core::effects::{CollectiveEffects, CollectiveError, CollectiveOp, ReduceFn};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Barrier, Mutex};

/// Per-rank collective call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectiveStats {
    /// Reductions entered
    pub reduce_all_calls: usize,
    /// Personalised exchanges entered
    pub all_to_all_calls: usize,
}

impl CollectiveStats {
    /// Total collectives entered
    pub fn total(&self) -> usize {
        self.reduce_all_calls + self.all_to_all_calls
    }
}

#[derive(Debug, Default)]
struct StatsCounters {
    reduce_all: AtomicUsize,
    all_to_all: AtomicUsize,
}

impl StatsCounters {
    fn record(&self, op: CollectiveOp) {
        let counter = match op {
            CollectiveOp::ReduceAll => &self.reduce_all,
            CollectiveOp::AllToAll => &self.all_to_all,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CollectiveStats {
        CollectiveStats {
            reduce_all_calls: self.reduce_all.load(Ordering::Relaxed),
            all_to_all_calls: self.all_to_all.load(Ordering::Relaxed),
        }
    }
}

/// State shared by every rank of one group
#[derive(Debug)]
struct SharedGroup {
    size: usize,
    /// Contribution of each rank to the current collective
    slots: Mutex<Vec<Option<(CollectiveOp, Vec<u8>)>>>,
    barrier: Barrier,
    /// Collectives that fail on every rank
    faults: BTreeSet<CollectiveOp>,
}

/// Factory for in-memory process groups
pub struct InMemoryCollectiveGroup;

impl InMemoryCollectiveGroup {
    /// Create a group of `size` ranks; handler `r` has rank `r`
    pub fn new(size: usize) -> Vec<InMemoryCollectiveHandler> {
        Self::with_faults(size, [])
    }

    /// Create a group whose listed collectives fail uniformly on every rank
    pub fn with_faults(
        size: usize,
        faults: impl IntoIterator<Item = CollectiveOp>,
    ) -> Vec<InMemoryCollectiveHandler> {
        let shared = Arc::new(SharedGroup {
            size,
            slots: Mutex::new(vec![None; size]),
            barrier: Barrier::new(size.max(1)),
            faults: faults.into_iter().collect(),
        });

        (0..size)
            .map(|rank| InMemoryCollectiveHandler {
                rank,
                shared: Arc::clone(&shared),
                stats: Arc::new(StatsCounters::default()),
            })
            .collect()
    }

    /// Drive one future per rank concurrently and collect results in rank order
    pub async fn run<F, Fut, R>(handlers: Vec<InMemoryCollectiveHandler>, per_rank: F) -> Vec<R>
    where
        F: Fn(InMemoryCollectiveHandler) -> Fut,
        Fut: Future<Output = R>,
    {
        join_all(handlers.into_iter().map(per_rank)).await
    }
}

/// One rank of an in-memory process group
#[derive(Debug, Clone)]
pub struct InMemoryCollectiveHandler {
    rank: usize,
    shared: Arc<SharedGroup>,
    stats: Arc<StatsCounters>,
}

impl InMemoryCollectiveHandler {
    /// Collective calls this rank has entered so far
    pub fn stats(&self) -> CollectiveStats {
        self.stats.snapshot()
    }

    /// Deposit `send`, wait for every rank, and read all contributions in rank order
    async fn all_gather(
        &self,
        op: CollectiveOp,
        send: Vec<u8>,
    ) -> Result<Vec<Vec<u8>>, CollectiveError> {
        self.stats.record(op);

        if self.shared.faults.contains(&op) {
            tracing::debug!(rank = self.rank, op = %op, "Injected collective fault");
            return Err(CollectiveError::failed(op, "injected fault"));
        }

        {
            let mut slots = self.shared.slots.lock().await;
            slots[self.rank] = Some((op, send));
        }
        self.shared.barrier.wait().await;

        let gathered = {
            let slots = self.shared.slots.lock().await;
            slots
                .iter()
                .enumerate()
                .map(|(rank, slot)| match slot {
                    Some((entered, bytes)) if *entered == op => Ok(bytes.clone()),
                    Some((entered, _)) => Err(CollectiveError::failed(
                        op,
                        format!("rank {rank} entered {entered} instead"),
                    )),
                    None => Err(CollectiveError::failed(
                        op,
                        format!("rank {rank} contributed nothing"),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
        };
        // Slots are reused by the next collective only after every rank has read them
        self.shared.barrier.wait().await;

        tracing::trace!(rank = self.rank, op = %op, ranks = self.shared.size, "Gathered contributions");
        gathered
    }
}

#[async_trait]
impl CollectiveEffects for InMemoryCollectiveHandler {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    async fn reduce_all_with(
        &self,
        send: Vec<u8>,
        op: &ReduceFn,
    ) -> Result<Vec<u8>, CollectiveError> {
        let gathered = self.all_gather(CollectiveOp::ReduceAll, send).await?;
        let mut contributions = gathered.into_iter();
        let first = contributions
            .next()
            .ok_or_else(|| CollectiveError::failed(CollectiveOp::ReduceAll, "empty group"))?;
        contributions.try_fold(first, |acc, incoming| op(&acc, &incoming))
    }

    async fn all_to_all(
        &self,
        send: Vec<u8>,
        bytes_per_rank: usize,
    ) -> Result<Vec<u8>, CollectiveError> {
        let expected = bytes_per_rank * self.shared.size;
        let gathered = self.all_gather(CollectiveOp::AllToAll, send).await?;

        // Validate every sender after the gather so all ranks fail alike
        if let Some(bad) = gathered.iter().find(|buf| buf.len() != expected) {
            return Err(CollectiveError::BufferMismatch {
                expected,
                actual: bad.len(),
            });
        }

        let start = self.rank * bytes_per_rank;
        let mut received = Vec::with_capacity(expected);
        for buf in &gathered {
            received.extend_from_slice(&buf[start..start + bytes_per_rank]);
        }
        Ok(received)
    }
}
