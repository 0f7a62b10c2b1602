use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{Address, Chain};

/// Default time a superseded guardian set keeps verifying: 24 hours.
pub const DEFAULT_GUARDIAN_SET_EXPIRATION: u32 = 24 * 60 * 60;

/// Parameters of one destination.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The chain id of this destination.
    pub chain_id: Chain,

    /// Address of the contract or program consuming VAAs. Claims are scoped to it.
    pub contract: Address,

    /// Seconds for which a guardian set stays valid after it has been replaced.
    #[serde(default = "default_guardian_set_expiration")]
    pub guardian_set_expiration: u32,
}

fn default_guardian_set_expiration() -> u32 {
    DEFAULT_GUARDIAN_SET_EXPIRATION
}

impl Config {
    pub fn new(chain_id: Chain, contract: Address) -> Self {
        Config {
            chain_id,
            contract,
            guardian_set_expiration: DEFAULT_GUARDIAN_SET_EXPIRATION,
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse config")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        Self::from_json(&json).with_context(|| format!("invalid config in {}", path.display()))
    }
}
