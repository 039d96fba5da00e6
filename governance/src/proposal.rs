//! Governance proposals, their tallies, and the vote record.

use crate::error::GovernanceError;
use kycdao_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sequential, zero-based proposal identifier.
pub type ProposalId = u64;

/// Lifecycle state of a proposal at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    /// Accepting votes: `now < start_time + voting_period`.
    Open,
    /// Voting period elapsed, not finalized yet.
    Closed,
    /// Quorum met and `for > against`. Terminal.
    Executed,
    /// Quorum met and `for <= against`. Terminal.
    Rejected,
}

/// Result of a successful finalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalOutcome {
    Executed,
    Rejected,
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub proposer: Address,
    pub start_time: Timestamp,
    pub for_votes: u128,
    pub against_votes: u128,
    pub executed: bool,
    pub rejected: bool,
}

impl Proposal {
    /// When voting closes under the given period.
    pub fn end_time(&self, voting_period_secs: u64) -> Timestamp {
        self.start_time.plus(voting_period_secs)
    }

    pub fn is_finalized(&self) -> bool {
        self.executed || self.rejected
    }

    pub fn total_votes(&self) -> u128 {
        self.for_votes.saturating_add(self.against_votes)
    }

    pub fn state(&self, now: Timestamp, voting_period_secs: u64) -> ProposalState {
        if self.executed {
            ProposalState::Executed
        } else if self.rejected {
            ProposalState::Rejected
        } else if self.start_time.has_expired(voting_period_secs, now) {
            ProposalState::Closed
        } else {
            ProposalState::Open
        }
    }
}

/// All proposals ever created plus the `(voter, proposal)` vote record.
///
/// Proposals are never deleted and the vote record only grows.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProposalStore {
    proposals: Vec<Proposal>,
    votes: HashSet<(Address, ProposalId)>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a proposal with zero tallies. Returns its id.
    pub fn create(&mut self, description: String, proposer: Address, now: Timestamp) -> ProposalId {
        let id = self.proposals.len() as ProposalId;
        self.proposals.push(Proposal {
            id,
            description,
            proposer,
            start_time: now,
            for_votes: 0,
            against_votes: 0,
            executed: false,
            rejected: false,
        });
        id
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        usize::try_from(id).ok().and_then(|i| self.proposals.get(i))
    }

    /// Like [`ProposalStore::get`], failing with `ProposalNotFound`.
    pub fn require(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.get(id).ok_or(GovernanceError::ProposalNotFound(id))
    }

    pub fn proposal_at(&self, index: usize) -> Option<&Proposal> {
        self.proposals.get(index)
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn has_voted(&self, voter: &Address, id: ProposalId) -> bool {
        self.votes.contains(&(voter.clone(), id))
    }

    /// Add `weight` to one side of the tally and mark every address in
    /// `voters` as having voted. All-or-nothing.
    pub fn record_vote(
        &mut self,
        id: ProposalId,
        voters: &[Address],
        support: bool,
        weight: u128,
    ) -> Result<(), GovernanceError> {
        let proposal = self.require(id)?;
        if let Some(voter) = voters.iter().find(|v| self.has_voted(v, id)) {
            return Err(GovernanceError::AlreadyVoted {
                voter: voter.clone(),
                proposal: id,
            });
        }
        let current = if support {
            proposal.for_votes
        } else {
            proposal.against_votes
        };
        let updated = current.checked_add(weight).ok_or(GovernanceError::Overflow)?;

        let proposal = self.get_mut(id)?;
        if support {
            proposal.for_votes = updated;
        } else {
            proposal.against_votes = updated;
        }
        for voter in voters {
            self.votes.insert((voter.clone(), id));
        }
        Ok(())
    }

    /// Mark a proposal executed or rejected.
    pub fn finalize(
        &mut self,
        id: ProposalId,
        outcome: ProposalOutcome,
    ) -> Result<(), GovernanceError> {
        let proposal = self.get_mut(id)?;
        if proposal.is_finalized() {
            return Err(GovernanceError::ProposalFinalized(id));
        }
        match outcome {
            ProposalOutcome::Executed => proposal.executed = true,
            ProposalOutcome::Rejected => proposal.rejected = true,
        }
        Ok(())
    }

    fn get_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, GovernanceError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.proposals.get_mut(i))
            .ok_or(GovernanceError::ProposalNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(seed: u64) -> Address {
        Address::from_low_u64(seed)
    }

    const PERIOD: u64 = 100;

    #[test]
    fn test_ids_are_sequential_from_zero() {
        let mut store = ProposalStore::new();
        assert_eq!(store.create("a".into(), wallet(1), Timestamp::new(10)), 0);
        assert_eq!(store.create("b".into(), wallet(1), Timestamp::new(11)), 1);
        assert_eq!(store.proposal_count(), 2);
        assert_eq!(store.proposal_at(1).unwrap().description, "b");
        assert!(store.get(2).is_none());
        assert_eq!(store.require(5), Err(GovernanceError::ProposalNotFound(5)));
    }

    #[test]
    fn test_state_transitions() {
        let mut store = ProposalStore::new();
        let id = store.create("p".into(), wallet(1), Timestamp::new(1_000));
        let p = store.get(id).unwrap().clone();

        assert_eq!(p.state(Timestamp::new(1_000), PERIOD), ProposalState::Open);
        assert_eq!(p.state(Timestamp::new(1_099), PERIOD), ProposalState::Open);
        assert_eq!(p.state(Timestamp::new(1_100), PERIOD), ProposalState::Closed);
        assert_eq!(p.end_time(PERIOD), Timestamp::new(1_100));

        store.finalize(id, ProposalOutcome::Rejected).unwrap();
        let p = store.get(id).unwrap();
        assert_eq!(p.state(Timestamp::new(1_100), PERIOD), ProposalState::Rejected);
        assert!(!p.executed);
    }

    #[test]
    fn test_record_vote_updates_one_side() {
        let mut store = ProposalStore::new();
        let id = store.create("p".into(), wallet(1), Timestamp::new(0));
        store.record_vote(id, &[wallet(2)], true, 7).unwrap();
        store.record_vote(id, &[wallet(3), wallet(4)], false, 5).unwrap();

        let p = store.get(id).unwrap();
        assert_eq!((p.for_votes, p.against_votes), (7, 5));
        assert_eq!(p.total_votes(), 12);
        assert!(store.has_voted(&wallet(4), id));
        assert!(!store.has_voted(&wallet(4), id + 1));
    }

    #[test]
    fn test_double_vote_leaves_tally_unchanged() {
        let mut store = ProposalStore::new();
        let id = store.create("p".into(), wallet(1), Timestamp::new(0));
        store.record_vote(id, &[wallet(2)], true, 7).unwrap();
        assert_eq!(
            store.record_vote(id, &[wallet(3), wallet(2)], true, 9),
            Err(GovernanceError::AlreadyVoted {
                voter: wallet(2),
                proposal: id
            })
        );
        assert_eq!(store.get(id).unwrap().for_votes, 7);
        assert!(!store.has_voted(&wallet(3), id));
    }

    #[test]
    fn test_tally_overflow_is_atomic() {
        let mut store = ProposalStore::new();
        let id = store.create("p".into(), wallet(1), Timestamp::new(0));
        store.record_vote(id, &[wallet(2)], true, u128::MAX).unwrap();
        assert_eq!(
            store.record_vote(id, &[wallet(3)], true, 1),
            Err(GovernanceError::Overflow)
        );
        assert!(!store.has_voted(&wallet(3), id));
    }

    #[test]
    fn test_finalize_once() {
        let mut store = ProposalStore::new();
        let id = store.create("p".into(), wallet(1), Timestamp::new(0));
        store.finalize(id, ProposalOutcome::Executed).unwrap();
        assert_eq!(
            store.finalize(id, ProposalOutcome::Rejected),
            Err(GovernanceError::ProposalFinalized(id))
        );
        let p = store.get(id).unwrap();
        assert!(p.executed && !p.rejected);
    }
}
