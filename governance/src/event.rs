//! Notifications emitted after a state change commits.

use crate::params::GovernableParam;
use crate::proposal::ProposalId;
use kycdao_types::{Address, Role, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

/// Which KYC flag an update touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycNamespace {
    /// `Member::has_passed_kyc`, set by admins, gates proposal creation.
    Membership,
    /// The ledger flag, set by `KYC_ROLE` holders, gates token transfers.
    Ledger,
}

/// Governance events for external observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
    MemberAdded {
        member: Address,
        base_voting_weight: u128,
    },
    MemberRemoved {
        member: Address,
    },
    KycStatusUpdated {
        account: Address,
        approved: bool,
        namespace: KycNamespace,
    },
    Minted {
        to: Address,
        amount: TokenAmount,
    },
    Transferred {
        from: Address,
        to: Address,
        amount: TokenAmount,
    },
    Delegated {
        delegator: Address,
        delegatee: Address,
    },
    Undelegated {
        delegator: Address,
        previous: Address,
    },
    ProposalCreated {
        id: ProposalId,
        proposer: Address,
        description: String,
        start_time: Timestamp,
    },
    Voted {
        proposal: ProposalId,
        voter: Address,
        support: bool,
        weight: u128,
    },
    ProposalExecuted {
        id: ProposalId,
        caller: Address,
    },
    ProposalRejected {
        id: ProposalId,
        caller: Address,
        for_votes: u128,
        against_votes: u128,
    },
    ParameterUpdated {
        param: GovernableParam,
        value: String,
    },
}

impl GovernanceEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoleGranted { .. } => "RoleGranted",
            Self::RoleRevoked { .. } => "RoleRevoked",
            Self::MemberAdded { .. } => "MemberAdded",
            Self::MemberRemoved { .. } => "MemberRemoved",
            Self::KycStatusUpdated { .. } => "KYCStatusUpdated",
            Self::Minted { .. } => "Minted",
            Self::Transferred { .. } => "Transferred",
            Self::Delegated { .. } => "Delegated",
            Self::Undelegated { .. } => "Undelegated",
            Self::ProposalCreated { .. } => "ProposalCreated",
            Self::Voted { .. } => "Voted",
            Self::ProposalExecuted { .. } => "ProposalExecuted",
            Self::ProposalRejected { .. } => "ProposalRejected",
            Self::ParameterUpdated { .. } => "ParameterUpdated",
        }
    }
}
