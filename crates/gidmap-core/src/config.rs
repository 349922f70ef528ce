//! Decision configuration
//!
//! Loaded from TOML, then overridden from `GIDMAP_*` environment variables.
//! Every rank must run with the same configuration: the empty-shard policy
//! decides whether a rank may skip its precondition check, and ranks that
//! disagree would stop entering the same collectives.

use crate::errors::{GidError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding [`DecisionConfig::empty_shards`]
pub const EMPTY_SHARDS_ENV: &str = "GIDMAP_EMPTY_SHARDS";

/// What a rank with no ordinal identifiers does in a decision call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyShardPolicy {
    /// Fail with `EmptyShard` before any collective is entered
    #[default]
    Reject,
    /// Take part with a zero-length run; the rank owns an empty range
    Participate,
}

impl EmptyShardPolicy {
    /// Stable configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Participate => "participate",
        }
    }
}

impl fmt::Display for EmptyShardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmptyShardPolicy {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "participate" => Ok(Self::Participate),
            other => Err(GidError::config(format!("Unknown empty shard policy '{other}'"))),
        }
    }
}

/// Configuration for the consecutiveness decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecisionConfig {
    /// Handling of ranks whose ordinal shard is empty
    pub empty_shards: EmptyShardPolicy,
}

impl DecisionConfig {
    /// Parse from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GidError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `GIDMAP_*` environment overrides
    pub fn merge_with_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(EMPTY_SHARDS_ENV) {
            self.set_from_string("empty_shards", &value)?;
        }
        Ok(())
    }

    /// Set a configuration value by key
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "empty_shards" => {
                self.empty_shards = value.parse()?;
                Ok(())
            }
            other => Err(GidError::config(format!("Unknown config key '{other}'"))),
        }
    }
}
