//! Governance for the KYC DAO.
//!
//! Approved members vote on proposals with weight derived from a base weight
//! and their token balance. A member may entrust its vote to another member
//! (one hop only). Proposals are finalized after their voting period if
//! enough of the token supply took part.

pub mod delegation;
pub mod engine;
pub mod error;
pub mod event;
pub mod membership;
pub mod params;
pub mod power;
pub mod proposal;

pub use delegation::DelegationRegistry;
pub use engine::{GovernanceEngine, State};
pub use error::{ErrorKind, GovernanceError};
pub use event::{GovernanceEvent, KycNamespace};
pub use membership::{Member, MembershipRegistry};
pub use params::GovernableParam;
pub use power::{quorum_threshold, voting_power};
pub use proposal::{Proposal, ProposalId, ProposalOutcome, ProposalState, ProposalStore};
