//! Governance parameters, read live by every quorum and window check.
//!
//! Changing a parameter affects every proposal from that moment on,
//! including proposals that are already open.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};

/// How an address's voting power is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteWeight {
    /// Only the admin-assigned base weight.
    BaseOnly,
    /// Only the ledger token balance.
    BalanceOnly,
    /// Base weight plus token balance.
    #[default]
    BasePlusBalance,
}

/// Process-wide governance parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Share of total token supply (percent, 1..=100) that must vote
    /// before a proposal can be finalized.
    #[serde(default = "default_quorum_percentage")]
    pub quorum_percentage: u32,

    /// Length of the voting window in seconds.
    #[serde(default = "default_voting_period_secs")]
    pub voting_period_secs: u64,

    /// Voting power formula.
    #[serde(default)]
    pub vote_weight: VoteWeight,
}

fn default_quorum_percentage() -> u32 {
    50
}

fn default_voting_period_secs() -> u64 {
    7 * 24 * 3600 // 1 week
}

impl GovernanceParams {
    pub const MIN_QUORUM_PERCENTAGE: u32 = 1;
    pub const MAX_QUORUM_PERCENTAGE: u32 = 100;

    pub fn validate_quorum(pct: u32) -> Result<u32, TypesError> {
        if (Self::MIN_QUORUM_PERCENTAGE..=Self::MAX_QUORUM_PERCENTAGE).contains(&pct) {
            Ok(pct)
        } else {
            Err(TypesError::InvalidQuorum(pct))
        }
    }

    pub fn validate_voting_period(secs: u64) -> Result<u64, TypesError> {
        if secs == 0 {
            Err(TypesError::InvalidVotingPeriod)
        } else {
            Ok(secs)
        }
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), TypesError> {
        Self::validate_quorum(self.quorum_percentage)?;
        Self::validate_voting_period(self.voting_period_secs)?;
        Ok(())
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            quorum_percentage: default_quorum_percentage(),
            voting_period_secs: default_voting_period_secs(),
            vote_weight: VoteWeight::default(),
        }
    }
}
