//! # gidmap Protocol - Global Consecutiveness Decision
//!
//! Given a shard of user global identifiers on every rank of a process group,
//! decide collectively whether their union is already one consecutive range
//! in rank order. When it is, every rank receives the same
//! [`DistributionDescriptor`] and the costly global-to-local translation can
//! be skipped.
//!
//! ## Design Principles
//!
//! - **No gathering**: only lengths, min/max, one flag and each rank's
//!   `[first, last]` cross the wire
//! - **Uniform control flow**: every rank enters the same collectives in the
//!   same order, so a failed precondition can never strand its peers
//! - **Shared answer**: all ranks return identical decisions
//!
//! ```ignore
//! let decision = globally_consecutive_ordinals(&comm, &my_ids).await?;
//! if let Some(dist) = decision.descriptor() {
//!     let owner = dist.owner_of(&gid)?;
//! }
//! ```

#![forbid(unsafe_code)]

pub mod consecutive;
pub mod distribution;

pub use consecutive::{
    globally_consecutive_ordinals, globally_consecutive_ordinals_with, ConsecutiveDecision,
    ConsecutivenessProtocol, IdLayout,
};
pub use distribution::DistributionDescriptor;
