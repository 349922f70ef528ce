//! Effect interfaces
//!
//! Pure trait signatures for the external layers gidmap talks to. Handlers
//! are provided by `gidmap-effects`.

pub mod collective;

pub use collective::{
    decode_u64_lanes, encode_u64_lanes, CollectiveEffects, CollectiveError, CollectiveOp,
    ReduceFn, ReduceOp,
};
