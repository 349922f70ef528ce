//! Single-rank collective handler
//!
//! A group of exactly one process. Collectives are local no-ops that still
//! validate their buffers and are counted, so callers can be checked for
//! skipping communication they do not need.

use crate::memory::CollectiveStats;
use async_trait::async_trait;
use gidmap_core::effects::{CollectiveEffects, CollectiveError, ReduceFn};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collective handler for a process group of one
#[derive(Debug, Default)]
pub struct SingleRankCollective {
    reduce_all_calls: AtomicUsize,
    all_to_all_calls: AtomicUsize,
}

impl SingleRankCollective {
    /// Create the handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Collective calls entered so far
    pub fn stats(&self) -> CollectiveStats {
        CollectiveStats {
            reduce_all_calls: self.reduce_all_calls.load(Ordering::Relaxed),
            all_to_all_calls: self.all_to_all_calls.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl CollectiveEffects for SingleRankCollective {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    async fn reduce_all_with(
        &self,
        send: Vec<u8>,
        _op: &ReduceFn,
    ) -> Result<Vec<u8>, CollectiveError> {
        self.reduce_all_calls.fetch_add(1, Ordering::Relaxed);
        Ok(send)
    }

    async fn all_to_all(
        &self,
        send: Vec<u8>,
        bytes_per_rank: usize,
    ) -> Result<Vec<u8>, CollectiveError> {
        self.all_to_all_calls.fetch_add(1, Ordering::Relaxed);
        if send.len() != bytes_per_rank {
            return Err(CollectiveError::BufferMismatch {
                expected: bytes_per_rank,
                actual: send.len(),
            });
        }
        Ok(send)
    }
}
