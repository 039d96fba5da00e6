//! Transport-neutral request and response envelopes.
//!
//! A request is JSON of the form `{"op": "vote", "args": {...}}`; operations
//! without arguments omit `args`. Every state-changing operation names its
//! `caller`. A response is either `{"status": "ok", "value": ...}` or
//! `{"status": "err", "kind": "<taxonomy name>", "message": "..."}`.

use serde::{Deserialize, Serialize};

use kycdao_governance::{
    ErrorKind, GovernanceError, Member, Proposal, ProposalId, ProposalOutcome, ProposalState,
};
use kycdao_types::{Address, GovernanceParams, Role, TokenAmount, VoteWeight};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Request {
    // Roles
    GrantRole {
        caller: Address,
        role: Role,
        account: Address,
    },
    RevokeRole {
        caller: Address,
        role: Role,
        account: Address,
    },
    RenounceRole {
        caller: Address,
        role: Role,
    },
    SetRoleAdmin {
        caller: Address,
        role: Role,
        admin_role: Role,
    },
    HasRole {
        role: Role,
        account: Address,
    },
    RoleMembers {
        role: Role,
    },

    // Membership
    AddMember {
        caller: Address,
        account: Address,
        base_voting_weight: u128,
    },
    RemoveMember {
        caller: Address,
        account: Address,
    },
    UpdateKycStatus {
        caller: Address,
        account: Address,
        passed: bool,
    },
    IsMember {
        account: Address,
    },
    Member {
        account: Address,
    },
    MemberAt {
        index: usize,
    },
    MemberCount,
    ActiveMembers,

    // Voting power and delegation
    VotingPowerOf {
        account: Address,
    },
    DelegatedVotingPowerOf {
        account: Address,
    },
    Delegate {
        caller: Address,
        delegatee: Address,
    },
    Undelegate {
        caller: Address,
    },
    DelegateOf {
        account: Address,
    },
    DelegatorsOf {
        account: Address,
    },

    // Token ledger
    Mint {
        caller: Address,
        to: Address,
        amount: TokenAmount,
    },
    SetKycStatus {
        caller: Address,
        account: Address,
        approved: bool,
    },
    Transfer {
        caller: Address,
        to: Address,
        amount: TokenAmount,
    },
    BalanceOf {
        account: Address,
    },
    TotalSupply,
    IsKycApproved {
        account: Address,
    },
    Holders,

    // Proposals
    CreateProposal {
        caller: Address,
        description: String,
    },
    Vote {
        caller: Address,
        proposal: ProposalId,
        support: bool,
    },
    ExecuteProposal {
        caller: Address,
        proposal: ProposalId,
    },
    Proposal {
        proposal: ProposalId,
    },
    ProposalAt {
        index: usize,
    },
    ProposalCount,
    ProposalState {
        proposal: ProposalId,
    },
    HasVoted {
        voter: Address,
        proposal: ProposalId,
    },
    QuorumThreshold,

    // Parameters
    SetQuorumPercentage {
        caller: Address,
        quorum_percentage: u32,
    },
    SetVotingPeriod {
        caller: Address,
        voting_period_secs: u64,
    },
    SetVoteWeight {
        caller: Address,
        vote_weight: VoteWeight,
    },
    QuorumPercentage,
    VotingPeriod,
    Params,
}

impl Request {
    /// The `op` tag, for logs and spans.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GrantRole { .. } => "grant_role",
            Self::RevokeRole { .. } => "revoke_role",
            Self::RenounceRole { .. } => "renounce_role",
            Self::SetRoleAdmin { .. } => "set_role_admin",
            Self::HasRole { .. } => "has_role",
            Self::RoleMembers { .. } => "role_members",
            Self::AddMember { .. } => "add_member",
            Self::RemoveMember { .. } => "remove_member",
            Self::UpdateKycStatus { .. } => "update_kyc_status",
            Self::IsMember { .. } => "is_member",
            Self::Member { .. } => "member",
            Self::MemberAt { .. } => "member_at",
            Self::MemberCount => "member_count",
            Self::ActiveMembers => "active_members",
            Self::VotingPowerOf { .. } => "voting_power_of",
            Self::DelegatedVotingPowerOf { .. } => "delegated_voting_power_of",
            Self::Delegate { .. } => "delegate",
            Self::Undelegate { .. } => "undelegate",
            Self::DelegateOf { .. } => "delegate_of",
            Self::DelegatorsOf { .. } => "delegators_of",
            Self::Mint { .. } => "mint",
            Self::SetKycStatus { .. } => "set_kyc_status",
            Self::Transfer { .. } => "transfer",
            Self::BalanceOf { .. } => "balance_of",
            Self::TotalSupply => "total_supply",
            Self::IsKycApproved { .. } => "is_kyc_approved",
            Self::Holders => "holders",
            Self::CreateProposal { .. } => "create_proposal",
            Self::Vote { .. } => "vote",
            Self::ExecuteProposal { .. } => "execute_proposal",
            Self::Proposal { .. } => "proposal",
            Self::ProposalAt { .. } => "proposal_at",
            Self::ProposalCount => "proposal_count",
            Self::ProposalState { .. } => "proposal_state",
            Self::HasVoted { .. } => "has_voted",
            Self::QuorumThreshold => "quorum_threshold",
            Self::SetQuorumPercentage { .. } => "set_quorum_percentage",
            Self::SetVotingPeriod { .. } => "set_voting_period",
            Self::SetVoteWeight { .. } => "set_vote_weight",
            Self::QuorumPercentage => "quorum_percentage",
            Self::VotingPeriod => "voting_period",
            Self::Params => "params",
        }
    }
}

/// The value carried by a successful response.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Serialized as `null`.
    Unit,
    Bool(bool),
    Count(usize),
    Id(ProposalId),
    Percentage(u32),
    Seconds(u64),
    Weight(u128),
    Amount(TokenAmount),
    Address(Option<Address>),
    Addresses(Vec<Address>),
    Holders(Vec<(Address, TokenAmount)>),
    Member(Option<Member>),
    Proposal(Option<Proposal>),
    ProposalState(Option<ProposalState>),
    Outcome(ProposalOutcome),
    Params(GovernanceParams),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { value: Reply },
    Err { kind: ErrorKind, message: String },
}

impl Response {
    /// Response for input that never reached the engine.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::Err {
            kind: ErrorKind::InvalidParameter,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { kind, .. } => Some(*kind),
        }
    }
}

impl From<Result<Reply, GovernanceError>> for Response {
    fn from(result: Result<Reply, GovernanceError>) -> Self {
        match result {
            Ok(value) => Self::Ok { value },
            Err(e) => Self::Err {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}
