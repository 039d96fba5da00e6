//! Admin-tunable governance parameters.
//!
//! Changes apply immediately to every proposal, including ones already open.

use serde::{Deserialize, Serialize};

/// Parameters an admin can change at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernableParam {
    QuorumPercentage,
    VotingPeriod,
    VoteWeight,
}

impl GovernableParam {
    /// Human-readable name of this parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Self::QuorumPercentage => "quorum_percentage",
            Self::VotingPeriod => "voting_period_secs",
            Self::VoteWeight => "vote_weight",
        }
    }
}
