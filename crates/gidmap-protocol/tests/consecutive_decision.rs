//! Global consecutiveness decision across in-memory process groups

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use gidmap_core::effects::CollectiveOp;
use gidmap_core::{CollectiveEffects, DecisionConfig, EmptyShardPolicy, GidError, Identifier, Result};
use gidmap_effects::{
    init_test_tracing, CollectiveStats, InMemoryCollectiveGroup, InMemoryCollectiveHandler,
    SingleRankCollective,
};
use gidmap_protocol::{
    globally_consecutive_ordinals, globally_consecutive_ordinals_with, ConsecutiveDecision,
    ConsecutivenessProtocol, IdLayout,
};

type RankOutcome<T> = (Result<ConsecutiveDecision<T>>, CollectiveStats);

async fn run_group<T: Identifier>(
    handlers: Vec<InMemoryCollectiveHandler>,
    shards: Vec<Vec<T>>,
    config: DecisionConfig,
) -> Vec<RankOutcome<T>> {
    init_test_tracing();
    let shards = &shards;
    let config = &config;
    InMemoryCollectiveGroup::run(handlers, |h| async move {
        let result = globally_consecutive_ordinals_with(&h, &shards[h.rank()], config).await;
        (result, h.stats())
    })
    .await
}

async fn decide_all<T: Identifier>(shards: Vec<Vec<T>>) -> Vec<RankOutcome<T>> {
    let handlers = InMemoryCollectiveGroup::new(shards.len());
    run_group(handlers, shards, DecisionConfig::default()).await
}

/// Every rank succeeded with the same decision; return it
fn agreed<T: Identifier + PartialEq>(outcomes: Vec<RankOutcome<T>>) -> ConsecutiveDecision<T> {
    let mut decisions = outcomes.into_iter().map(|(result, _)| result.unwrap());
    let first = decisions.next().unwrap();
    for other in decisions {
        assert_eq!(other, first, "ranks disagree on the decision");
    }
    first
}

#[tokio::test]
async fn test_three_rank_consecutive_layout() {
    let outcomes = decide_all(vec![vec![0u32, 1, 2], vec![3, 4], vec![5, 6, 7, 8]]).await;
    for (_, stats) in &outcomes {
        assert_eq!(stats.reduce_all_calls, 3);
        assert_eq!(stats.all_to_all_calls, 1);
    }

    let decision = agreed(outcomes);
    assert_eq!(decision.global_len, 9);
    assert!(decision.is_consecutive());
    let dist = decision.descriptor().unwrap();
    assert_eq!(dist.as_slice(), &[0, 3, 5, 9]);
    assert_eq!(decision.range_buffer(), vec![0, 3, 5, 9]);

    assert_eq!(dist.owner_of(&4).unwrap(), Some(1));
    assert_eq!(dist.owner_of(&8).unwrap(), Some(2));
    assert_eq!(dist.owner_of(&9).unwrap(), None);
    assert_eq!(dist.local_len(2), Some(4));
}

#[tokio::test]
async fn test_negative_identifiers() {
    let decision = agreed(decide_all(vec![vec![-3i64, -2], vec![-1, 0, 1]]).await);
    assert_eq!(decision.descriptor().unwrap().as_slice(), &[-3, -1, 2]);
}

#[tokio::test]
async fn test_ranks_out_of_order() {
    let decision = agreed(decide_all(vec![vec![5i32, 6], vec![0, 1, 2, 3, 4]]).await);
    assert_eq!(decision.global_len, 7);
    assert!(!decision.is_consecutive());
    assert_eq!(decision.range(), Some((&0, &6)));
    assert_eq!(decision.range_buffer(), vec![0, 6]);
}

#[tokio::test]
async fn test_unsorted_shard_skips_exchange() {
    let outcomes = decide_all(vec![vec![0u32, 2, 1], vec![3, 4]]).await;
    for (_, stats) in &outcomes {
        assert_eq!(stats.reduce_all_calls, 3);
        assert_eq!(stats.all_to_all_calls, 0);
    }
    let decision = agreed(outcomes);
    assert_eq!(decision.layout, IdLayout::Range { min: 0, max: 4 });
}

#[tokio::test]
async fn test_gap_fails_pigeonhole_without_further_communication() {
    let outcomes = decide_all(vec![vec![0u64, 1], vec![10, 11]]).await;
    for (_, stats) in &outcomes {
        assert_eq!(stats.reduce_all_calls, 2);
        assert_eq!(stats.all_to_all_calls, 0);
    }
    let decision = agreed(outcomes);
    assert_eq!(decision.global_len, 4);
    assert_eq!(decision.range(), Some((&0, &11)));
}

#[tokio::test]
async fn test_duplicates_fail_pigeonhole() {
    let decision = agreed(decide_all(vec![vec![0i16, 1, 2], vec![2, 3]]).await);
    assert!(!decision.is_consecutive());
    assert_eq!(decision.range(), Some((&0, &3)));
}

#[tokio::test]
async fn test_strings_only_report_global_length() {
    let shards = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["c".to_string()],
        vec![],
    ];
    let outcomes = decide_all(shards).await;
    for (_, stats) in &outcomes {
        assert_eq!(stats.total(), 1);
    }
    let decision = agreed(outcomes);
    assert_eq!(decision.global_len, 3);
    assert_eq!(decision.layout, IdLayout::Unordered);
    assert!(decision.range_buffer().is_empty());
}

#[tokio::test]
async fn test_pairs_only_report_global_length() {
    let decision = agreed(decide_all(vec![vec![(0u32, 1u32)], vec![(0, 2), (1, 0)]]).await);
    assert_eq!(decision.global_len, 3);
    assert!(!decision.is_consecutive());
}

#[tokio::test]
async fn test_wide_pairs_rejected_before_communicating() {
    let outcomes = decide_all(vec![vec![(1u64, 1u64)], vec![(2, 2)]]).await;
    for (result, stats) in outcomes {
        assert_matches!(result, Err(GidError::UnsupportedIdentifierType { .. }));
        assert_eq!(stats.total(), 0);
    }
}

#[tokio::test]
async fn test_overlapping_runs_with_gap_are_not_consecutive() {
    // starts 0 < 2 < 5 increase, but 2 appears twice and 4 is missing
    let outcomes = decide_all(vec![vec![0u32, 1, 2, 3], vec![2], vec![5]]).await;
    for (_, stats) in &outcomes {
        assert_eq!(stats.all_to_all_calls, 1);
    }
    let decision = agreed(outcomes);
    assert_eq!(decision.global_len, 6);
    assert_eq!(decision.layout, IdLayout::Range { min: 0, max: 5 });

    let decision = agreed(decide_all(vec![vec![0u32, 1, 2], vec![2, 3], vec![5, 6]]).await);
    assert_eq!(decision.global_len, 7);
    assert_eq!(decision.range(), Some((&0, &6)));
}

#[tokio::test]
async fn test_injected_exchange_fault_fails_every_rank() {
    let handlers = InMemoryCollectiveGroup::with_faults(3, [CollectiveOp::AllToAll]);
    let shards = vec![vec![0u32, 1], vec![2], vec![3, 4]];
    let outcomes = run_group(handlers, shards, DecisionConfig::default()).await;
    for (result, stats) in outcomes {
        let err = result.unwrap_err();
        assert!(err.is_collective(), "unexpected error {err:?}");
        assert_eq!(stats.all_to_all_calls, 1);
    }
}

#[tokio::test]
async fn test_injected_reduction_fault_fails_first_step() {
    let handlers = InMemoryCollectiveGroup::with_faults(2, [CollectiveOp::ReduceAll]);
    let shards = vec![vec![0u32], vec![1]];
    let outcomes = run_group(handlers, shards, DecisionConfig::default()).await;
    for (result, stats) in outcomes {
        assert_matches!(result, Err(GidError::Collective { .. }));
        assert_eq!(stats.reduce_all_calls, 1);
    }
}

#[tokio::test]
async fn test_sentinel_overflow_reported_on_every_rank() {
    let outcomes = decide_all(vec![vec![250u8, 251, 252], vec![253, 254, 255]]).await;
    for (result, _) in outcomes {
        assert_matches!(result, Err(GidError::RangeOverflow { .. }));
    }
}

fn participate() -> DecisionConfig {
    DecisionConfig {
        empty_shards: EmptyShardPolicy::Participate,
    }
}

#[tokio::test]
async fn test_protocol_handler_uses_its_config() {
    let protocol = ConsecutivenessProtocol::new(participate());
    assert_eq!(protocol.config().empty_shards, EmptyShardPolicy::Participate);

    let comm = SingleRankCollective::new();
    let decision = protocol.decide(&comm, &[7u32, 8, 9]).await.unwrap();
    assert_eq!(decision.descriptor().unwrap().as_slice(), &[7, 10]);
}

#[tokio::test]
async fn test_empty_ranks_participate_with_empty_ranges() {
    let shards = vec![vec![], vec![10u8, 11], vec![], vec![12], vec![]];
    let outcomes = run_group(InMemoryCollectiveGroup::new(5), shards, participate()).await;
    for (_, stats) in &outcomes {
        assert_eq!(stats.all_to_all_calls, 1);
    }

    let decision = agreed(outcomes);
    assert_eq!(decision.global_len, 3);
    let dist = decision.descriptor().unwrap();
    assert_eq!(dist.as_slice(), &[10, 10, 12, 12, 13, 13]);
    assert_eq!(dist.local_len(0), Some(0));
    assert_eq!(dist.local_len(1), Some(2));
    assert_eq!(dist.owner_of(&10).unwrap(), Some(1));
    assert_eq!(dist.owner_of(&12).unwrap(), Some(3));
}

#[tokio::test]
async fn test_empty_ranks_do_not_hide_a_gap() {
    let shards = vec![vec![0i32, 1], vec![], vec![1, 2]];
    let decision = agreed(run_group(InMemoryCollectiveGroup::new(3), shards, participate()).await);
    assert!(!decision.is_consecutive());

    let shards = vec![vec![3i32, 4], vec![], vec![0, 1, 2]];
    let decision = agreed(run_group(InMemoryCollectiveGroup::new(3), shards, participate()).await);
    assert_eq!(decision.range(), Some((&0, &4)));
}

#[tokio::test]
async fn test_all_empty_group_reports_nothing() {
    let shards: Vec<Vec<u64>> = vec![vec![], vec![]];
    let outcomes = run_group(InMemoryCollectiveGroup::new(2), shards, participate()).await;
    for (_, stats) in &outcomes {
        assert_eq!(stats.total(), 1);
    }
    let decision = agreed(outcomes);
    assert_eq!(decision.global_len, 0);
    assert_eq!(decision.layout, IdLayout::Unordered);
}

#[tokio::test]
async fn test_single_rank_needs_no_exchange() {
    let comm = SingleRankCollective::new();
    let decision = globally_consecutive_ordinals(&comm, &[10i32, 11, 12, 13, 14])
        .await
        .unwrap();
    assert_eq!(decision.global_len, 5);
    assert_eq!(decision.descriptor().unwrap().as_slice(), &[10, 15]);
    assert_eq!(*decision.descriptor().unwrap().sentinel(), 15);
    assert_eq!(
        comm.stats(),
        CollectiveStats {
            reduce_all_calls: 1,
            all_to_all_calls: 0
        }
    );
}

#[tokio::test]
async fn test_single_rank_unsorted_shard() {
    let comm = SingleRankCollective::new();
    let decision = globally_consecutive_ordinals(&comm, &[3u16, 1, 2])
        .await
        .unwrap();
    assert_eq!(decision.layout, IdLayout::Range { min: 1, max: 3 });
    assert_eq!(comm.stats().all_to_all_calls, 0);
}

#[tokio::test]
async fn test_single_rank_sentinel_overflow() {
    let comm = SingleRankCollective::new();
    let err = globally_consecutive_ordinals(&comm, &[254u8, 255])
        .await
        .unwrap_err();
    assert_matches!(err, GidError::RangeOverflow { value: 256, .. });
}

#[tokio::test]
async fn test_empty_ordinal_shard_fails_before_communicating() {
    let comm = SingleRankCollective::new();
    let err = globally_consecutive_ordinals::<u32, _>(&comm, &[])
        .await
        .unwrap_err();
    assert_matches!(err, GidError::EmptyShard { rank: 0 });
    assert_eq!(comm.stats().total(), 0);
}

/// A group with no ranks; any collective call is a bug
struct NoRanks;

#[async_trait::async_trait]
impl CollectiveEffects for NoRanks {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        0
    }

    async fn reduce_all_with(
        &self,
        _send: Vec<u8>,
        _op: &gidmap_core::ReduceFn,
    ) -> std::result::Result<Vec<u8>, gidmap_core::CollectiveError> {
        panic!("reduce_all_with called on an empty group")
    }

    async fn all_to_all(
        &self,
        _send: Vec<u8>,
        _bytes_per_rank: usize,
    ) -> std::result::Result<Vec<u8>, gidmap_core::CollectiveError> {
        panic!("all_to_all called on an empty group")
    }
}

#[tokio::test]
async fn test_empty_group_is_not_consecutive() {
    let decision = globally_consecutive_ordinals(&NoRanks, &[1u32, 2, 3])
        .await
        .unwrap();
    assert_eq!(decision.global_len, 0);
    assert!(!decision.is_consecutive());

    let decision = globally_consecutive_ordinals::<u32, _>(&NoRanks, &[])
        .await
        .unwrap();
    assert_eq!(decision.global_len, 0);
}

mod properties {
    use super::*;
    use futures::executor::block_on;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_single_rank_ranges_are_consecutive(start in -1_000_000i64..1_000_000, len in 1i64..256) {
            let values: Vec<i64> = (start..start + len).collect();
            let comm = SingleRankCollective::new();
            let decision = block_on(globally_consecutive_ordinals(&comm, &values)).unwrap();
            prop_assert_eq!(decision.global_len, len as u64);
            let dist = decision.descriptor().unwrap();
            prop_assert_eq!(dist.as_slice(), &[start, start + len][..]);
            prop_assert_eq!(dist.owner_of(&(start + len / 2)).unwrap(), Some(0));
        }

        #[test]
        fn prop_single_rank_swapped_pair_is_rejected(start in 0u32..1_000, len in 2u32..64, at in 0usize..63) {
            let mut values: Vec<u32> = (start..start + len).collect();
            let i = at % (values.len() - 1);
            values.swap(i, i + 1);
            let comm = SingleRankCollective::new();
            let decision = block_on(globally_consecutive_ordinals(&comm, &values)).unwrap();
            prop_assert!(!decision.is_consecutive());
            prop_assert_eq!(decision.range(), Some((&start, &(start + len - 1))));
        }
    }
}
