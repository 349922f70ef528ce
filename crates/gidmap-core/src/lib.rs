//! gidmap Core - identifier capabilities and collective interfaces
//!
//! Foundation layer for deciding, across a group of ranks that each own a
//! shard of user global identifiers, whether those identifiers already form
//! one consecutive integer range.
//!
//! # Architecture Layers
//!
//! ## Identifier Trait Table
//! - `Identifier`: closed capability record for integers, `String`, pairs
//! - `Ordinal`: fixed-width integers with a total order
//! - `IdentifierTypeInfo`: capability summary for logs
//!
//! ## Local Primitives
//! - `local_min_max`, `is_locally_consecutive`, `byte_fold_hash`
//!
//! ## Effect Interfaces
//! - `CollectiveEffects`: `reduce_all_with`, `reduce_all_u64`, `all_to_all`
//!
//! ## Distributed Reduction
//! - `MinMaxReduction`, `global_min_max`

#![forbid(unsafe_code)]

/// Decision configuration (TOML + env)
pub mod config;

/// Pure effect interfaces
pub mod effects;

/// Unified error handling
pub mod errors;

/// Identifier capability trait table
pub mod identifier;

/// Single-rank analysis helpers
pub mod primitives;

/// Opaque min/max reduction
pub mod reduction;

pub use config::{DecisionConfig, EmptyShardPolicy};
pub use effects::{CollectiveEffects, CollectiveError, CollectiveOp, ReduceFn, ReduceOp};
pub use errors::{GidError, Result};
pub use identifier::{Identifier, IdentifierTypeInfo, Ordinal, PairKey};
pub use primitives::{byte_fold_hash, is_locally_consecutive, local_min_max, normalize_hash};
pub use reduction::{global_min_max, MinMaxReduction};
