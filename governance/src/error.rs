use crate::proposal::ProposalId;
use kycdao_access::AccessError;
use kycdao_ledger::LedgerError;
use kycdao_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{0} is not an approved member")]
    NotMember(Address),

    #[error("{0} is already an approved member")]
    AlreadyMember(Address),

    #[error("member {0} has not passed KYC")]
    KycRequired(Address),

    #[error("{0} has no voting power")]
    NoVotingPower(Address),

    #[error("{voter} has already voted on proposal {proposal}")]
    AlreadyVoted { voter: Address, proposal: ProposalId },

    #[error("{voter} delegated its vote to {delegate}, who votes on its behalf")]
    VoteDelegated { voter: Address, delegate: Address },

    #[error("voting on proposal {proposal} is open until {ends_at}")]
    VotingPeriodActive {
        proposal: ProposalId,
        ends_at: Timestamp,
    },

    #[error("voting on proposal {proposal} closed at {closed_at}")]
    VotingWindowClosed {
        proposal: ProposalId,
        closed_at: Timestamp,
    },

    #[error("quorum not reached: {votes} votes cast, {threshold} required")]
    QuorumNotReached { votes: u128, threshold: u128 },

    #[error("delegation target {0} is not an approved member")]
    NotApprovedMember(Address),

    #[error("cannot delegate to self")]
    SelfDelegation,

    #[error("delegation would form a chain: {0}")]
    DelegationChain(String),

    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("proposal {0} has already been finalized")]
    ProposalFinalized(ProposalId),

    #[error("invalid {param}: {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    #[error("arithmetic overflow in vote accounting")]
    Overflow,

    #[error("state snapshot error: {0}")]
    Snapshot(String),
}

/// The error taxonomy a transport surfaces to its users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "AuthorizationError")]
    Authorization,
    #[serde(rename = "NotMemberError")]
    NotMember,
    #[serde(rename = "AlreadyMemberError")]
    AlreadyMember,
    #[serde(rename = "KYCRequiredError")]
    KycRequired,
    #[serde(rename = "NoVotingPowerError")]
    NoVotingPower,
    #[serde(rename = "AlreadyVotedError")]
    AlreadyVoted,
    #[serde(rename = "VotingPeriodActiveError")]
    VotingPeriodActive,
    #[serde(rename = "VotingWindowClosedError")]
    VotingWindowClosed,
    #[serde(rename = "QuorumNotReachedError")]
    QuorumNotReached,
    #[serde(rename = "InsufficientBalanceError")]
    InsufficientBalance,
    #[serde(rename = "KYCNotApprovedError")]
    KycNotApproved,
    #[serde(rename = "InvalidParameterError")]
    InvalidParameter,
    #[serde(rename = "NotApprovedMemberError")]
    NotApprovedMember,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authorization => "AuthorizationError",
            Self::NotMember => "NotMemberError",
            Self::AlreadyMember => "AlreadyMemberError",
            Self::KycRequired => "KYCRequiredError",
            Self::NoVotingPower => "NoVotingPowerError",
            Self::AlreadyVoted => "AlreadyVotedError",
            Self::VotingPeriodActive => "VotingPeriodActiveError",
            Self::VotingWindowClosed => "VotingWindowClosedError",
            Self::QuorumNotReached => "QuorumNotReachedError",
            Self::InsufficientBalance => "InsufficientBalanceError",
            Self::KycNotApproved => "KYCNotApprovedError",
            Self::InvalidParameter => "InvalidParameterError",
            Self::NotApprovedMember => "NotApprovedMemberError",
            Self::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Access(_) => ErrorKind::Authorization,
            Self::Ledger(LedgerError::Access(_)) => ErrorKind::Authorization,
            Self::Ledger(LedgerError::KycNotApproved(_)) => ErrorKind::KycNotApproved,
            Self::Ledger(LedgerError::InsufficientBalance { .. }) => {
                ErrorKind::InsufficientBalance
            }
            Self::Ledger(LedgerError::Overflow) | Self::Overflow => ErrorKind::InvalidParameter,
            Self::NotMember(_) => ErrorKind::NotMember,
            Self::AlreadyMember(_) => ErrorKind::AlreadyMember,
            Self::KycRequired(_) => ErrorKind::KycRequired,
            Self::NoVotingPower(_) => ErrorKind::NoVotingPower,
            Self::AlreadyVoted { .. } | Self::VoteDelegated { .. } => ErrorKind::AlreadyVoted,
            Self::VotingPeriodActive { .. } => ErrorKind::VotingPeriodActive,
            Self::VotingWindowClosed { .. } => ErrorKind::VotingWindowClosed,
            Self::QuorumNotReached { .. } => ErrorKind::QuorumNotReached,
            Self::NotApprovedMember(_) => ErrorKind::NotApprovedMember,
            Self::SelfDelegation
            | Self::DelegationChain(_)
            | Self::ProposalNotFound(_)
            | Self::ProposalFinalized(_)
            | Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::Snapshot(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycdao_types::{Role, TokenAmount};

    #[test]
    fn authorization_kind_names_missing_role() {
        let err = GovernanceError::from(AccessError::Unauthorized {
            role: Role::Admin,
            account: Address::from_low_u64(7),
        });
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(err.to_string().contains("ADMIN_ROLE"));

        let minted = GovernanceError::from(LedgerError::Access(AccessError::Unauthorized {
            role: Role::Minter,
            account: Address::from_low_u64(7),
        }));
        assert_eq!(minted.kind(), ErrorKind::Authorization);
        assert!(minted.to_string().contains("MINTER_ROLE"));
    }

    #[test]
    fn ledger_errors_keep_their_kind() {
        let err = GovernanceError::from(LedgerError::InsufficientBalance {
            needed: TokenAmount::new(2),
            available: TokenAmount::new(1),
        });
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        let err = GovernanceError::from(LedgerError::KycNotApproved(Address::from_low_u64(1)));
        assert_eq!(err.kind().to_string(), "KYCNotApprovedError");
    }

    #[test]
    fn kind_serializes_as_taxonomy_name() {
        let json = serde_json::to_string(&ErrorKind::VotingWindowClosed).unwrap();
        assert_eq!(json, "\"VotingWindowClosedError\"");
        assert_eq!(ErrorKind::KycRequired.name(), "KYCRequiredError");
    }
}
