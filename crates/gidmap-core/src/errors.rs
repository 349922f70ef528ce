//! Unified error system for gidmap
//!
//! One error type for every layer. Identifier capability failures, collective
//! failures and caller precondition violations all surface through
//! [`GidError`] so a rank can report exactly why a decision call failed.

use crate::effects::CollectiveError;
use serde::{Deserialize, Serialize};

/// Unified error type for all gidmap operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GidError {
    /// The identifier type is outside the supported set
    #[error("Unsupported identifier type: {type_name}")]
    UnsupportedIdentifierType {
        /// Name of the rejected identifier type
        type_name: String,
    },

    /// The operation needs a capability the identifier type lacks
    #[error("Operation '{operation}' is invalid for identifier type {type_name}")]
    InvalidOperation {
        /// Name of the identifier type
        type_name: String,
        /// The operation that was attempted
        operation: String,
    },

    /// The communication layer reported a failure
    #[error("Collective operation '{operation}' failed: {message}")]
    Collective {
        /// The collective that failed
        operation: String,
        /// Failure reported by the communication layer
        message: String,
    },

    /// A group member entered a decision call with no local identifiers
    #[error("Rank {rank} entered a collective decision with an empty shard")]
    EmptyShard {
        /// Rank that violated the precondition
        rank: usize,
    },

    /// An ordinal value does not fit the identifier type
    #[error("Value {value} does not fit identifier type {type_name}")]
    RangeOverflow {
        /// Name of the identifier type
        type_name: String,
        /// Offending value, widened
        value: i128,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Encoding or decoding of a collective payload failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },
}

impl GidError {
    /// Create an unsupported identifier type error
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::UnsupportedIdentifierType {
            type_name: type_name.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(type_name: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::InvalidOperation {
            type_name: type_name.into(),
            operation: operation.into(),
        }
    }

    /// Create a collective failure error
    pub fn collective(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collective {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an empty shard precondition error
    pub fn empty_shard(rank: usize) -> Self {
        Self::EmptyShard { rank }
    }

    /// Create a range overflow error
    pub fn range_overflow(type_name: impl Into<String>, value: i128) -> Self {
        Self::RangeOverflow {
            type_name: type_name.into(),
            value,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Stable code for log correlation
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedIdentifierType { .. } => "unsupported_identifier_type",
            Self::InvalidOperation { .. } => "invalid_operation",
            Self::Collective { .. } => "collective_failure",
            Self::EmptyShard { .. } => "empty_shard",
            Self::RangeOverflow { .. } => "range_overflow",
            Self::Config { .. } => "config",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// Whether the error came from the communication layer
    pub fn is_collective(&self) -> bool {
        matches!(self, Self::Collective { .. })
    }
}

/// Standard Result type for gidmap operations
pub type Result<T> = std::result::Result<T, GidError>;

impl From<CollectiveError> for GidError {
    fn from(err: CollectiveError) -> Self {
        match &err {
            CollectiveError::OperationFailed { operation, .. } => {
                Self::collective(operation.clone(), err.to_string())
            }
            _ => Self::collective("collective", err.to_string()),
        }
    }
}

impl From<bincode::Error> for GidError {
    fn from(err: bincode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for GidError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<std::io::Error> for GidError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}
