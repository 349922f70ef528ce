//! # gidmap Effects - Collective Handlers
//!
//! Implementations of `gidmap_core::effects::CollectiveEffects`:
//! - `InMemoryCollectiveGroup` / `InMemoryCollectiveHandler`: a whole process
//!   group inside one runtime, for tests and simulation
//! - `SingleRankCollective`: a group of one
//!
//! Plus `logging::init_tracing` for installing a `tracing` subscriber.

#![forbid(unsafe_code)]

pub mod logging;
pub mod memory;
pub mod single;

pub use logging::{init_test_tracing, init_tracing};
pub use memory::{CollectiveStats, InMemoryCollectiveGroup, InMemoryCollectiveHandler};
pub use single::SingleRankCollective;
