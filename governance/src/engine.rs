//! Core governance engine: the single owner of all governance state.
//!
//! Every public operation takes the caller's identity explicitly and, for
//! time-dependent operations, the `now` read once by the caller. Each
//! operation validates completely before its first write, so an `Err`
//! means nothing changed. Events are queued only after a successful commit
//! and handed out by [`GovernanceEngine::drain_events`].

use crate::delegation::DelegationRegistry;
use crate::error::GovernanceError;
use crate::event::{GovernanceEvent, KycNamespace};
use crate::membership::{Member, MembershipRegistry};
use crate::params::GovernableParam;
use crate::power::{quorum_threshold, voting_power};
use crate::proposal::{Proposal, ProposalId, ProposalOutcome, ProposalState, ProposalStore};
use kycdao_access::RoleTable;
use kycdao_ledger::TokenLedger;
use kycdao_types::{Address, GovernanceParams, Role, Timestamp, TokenAmount, VoteWeight};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the engine owns, in one serializable value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct State {
    pub roles: RoleTable,
    pub members: MembershipRegistry,
    pub ledger: TokenLedger,
    pub delegations: DelegationRegistry,
    pub proposals: ProposalStore,
    pub params: GovernanceParams,
}

impl State {
    /// Fresh state with `admin` holding `ADMIN_ROLE`.
    pub fn genesis(admin: Address, params: GovernanceParams) -> Self {
        Self {
            roles: RoleTable::with_admin(admin),
            members: MembershipRegistry::new(),
            ledger: TokenLedger::new(),
            delegations: DelegationRegistry::new(),
            proposals: ProposalStore::new(),
            params,
        }
    }
}

pub struct GovernanceEngine {
    state: State,
    outbox: Vec<GovernanceEvent>,
}

impl GovernanceEngine {
    /// Bootstrap a new engine administered by `admin`.
    pub fn new(admin: Address, params: GovernanceParams) -> Result<Self, GovernanceError> {
        validate_params(&params)?;
        info!(admin = %admin, quorum = params.quorum_percentage, period = params.voting_period_secs, "governance engine bootstrapped");
        Ok(Self::from_state(State::genesis(admin, params)))
    }

    pub fn from_state(state: State) -> Self {
        Self {
            state,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Take every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ── Roles ────────────────────────────────────────────────────────────

    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, GovernanceError> {
        let changed = self.state.roles.grant_role(caller, role, account)?;
        if changed {
            info!(%role, account = %account, sender = %caller, "role granted");
            self.outbox.push(GovernanceEvent::RoleGranted {
                role,
                account: account.clone(),
                sender: caller.clone(),
            });
        }
        Ok(changed)
    }

    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, GovernanceError> {
        let changed = self.state.roles.revoke_role(caller, role, account)?;
        if changed {
            info!(%role, account = %account, sender = %caller, "role revoked");
            self.outbox.push(GovernanceEvent::RoleRevoked {
                role,
                account: account.clone(),
                sender: caller.clone(),
            });
        }
        Ok(changed)
    }

    pub fn renounce_role(&mut self, caller: &Address, role: Role) -> Result<bool, GovernanceError> {
        let changed = self.state.roles.renounce_role(caller, role)?;
        if changed {
            info!(%role, account = %caller, "role renounced");
            self.outbox.push(GovernanceEvent::RoleRevoked {
                role,
                account: caller.clone(),
                sender: caller.clone(),
            });
        }
        Ok(changed)
    }

    pub fn set_role_admin(
        &mut self,
        caller: &Address,
        role: Role,
        admin_role: Role,
    ) -> Result<(), GovernanceError> {
        self.state.roles.set_role_admin(caller, role, admin_role)?;
        info!(%role, %admin_role, "role admin changed");
        Ok(())
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.state.roles.has_role(role, account)
    }

    pub fn role_admin(&self, role: Role) -> Role {
        self.state.roles.role_admin(role)
    }

    pub fn role_members(&self, role: Role) -> Vec<&Address> {
        self.state.roles.members_of(role)
    }

    // ── Membership ───────────────────────────────────────────────────────

    pub fn add_member(
        &mut self,
        caller: &Address,
        account: &Address,
        base_voting_weight: u128,
    ) -> Result<(), GovernanceError> {
        self.state
            .members
            .add_member(&self.state.roles, caller, account, base_voting_weight)?;
        info!(member = %account, weight = base_voting_weight, "member added");
        self.outbox.push(GovernanceEvent::MemberAdded {
            member: account.clone(),
            base_voting_weight,
        });
        Ok(())
    }

    /// Tombstone a member, withdraw its own delegation and release every
    /// delegation pointing at it.
    pub fn remove_member(
        &mut self,
        caller: &Address,
        account: &Address,
    ) -> Result<(), GovernanceError> {
        self.state
            .members
            .remove_member(&self.state.roles, caller, account)?;
        let outgoing = self.state.delegations.undelegate(account);
        let released = self.state.delegations.release_delegators_of(account);
        info!(member = %account, released = released.len(), "member removed");
        self.outbox.push(GovernanceEvent::MemberRemoved {
            member: account.clone(),
        });
        if let Some(previous) = outgoing {
            self.outbox.push(GovernanceEvent::Undelegated {
                delegator: account.clone(),
                previous,
            });
        }
        for delegator in released {
            self.outbox.push(GovernanceEvent::Undelegated {
                delegator,
                previous: account.clone(),
            });
        }
        Ok(())
    }

    /// Set the membership KYC flag. Requires `ADMIN_ROLE`.
    ///
    /// Emits `KycStatusUpdated` only when the flag actually changes.
    pub fn update_kyc_status(
        &mut self,
        caller: &Address,
        account: &Address,
        passed: bool,
    ) -> Result<(), GovernanceError> {
        let changed = self
            .state
            .members
            .update_kyc_status(&self.state.roles, caller, account, passed)?;
        if changed {
            info!(member = %account, passed, "membership KYC updated");
            self.outbox.push(GovernanceEvent::KycStatusUpdated {
                account: account.clone(),
                approved: passed,
                namespace: KycNamespace::Membership,
            });
        }
        Ok(())
    }

    pub fn is_member(&self, account: &Address) -> bool {
        self.state.members.is_approved(account)
    }

    pub fn member(&self, account: &Address) -> Option<&Member> {
        self.state.members.member(account)
    }

    pub fn member_at(&self, index: usize) -> Option<&Member> {
        self.state.members.member_at(index)
    }

    pub fn member_count(&self) -> usize {
        self.state.members.member_count()
    }

    /// Approved members in slot order.
    pub fn active_members(&self) -> Vec<&Address> {
        self.state
            .members
            .active_members()
            .map(|m| &m.address)
            .collect()
    }

    // ── Voting power and delegation ──────────────────────────────────────

    /// Own voting power under the configured formula, ignoring delegations.
    pub fn voting_power_of(&self, account: &Address) -> u128 {
        voting_power(
            self.state.params.vote_weight,
            self.state.members.base_weight(account),
            self.state.ledger.balance_of(account),
        )
    }

    /// Own power plus the power of every approved direct delegator.
    pub fn delegated_voting_power_of(&self, account: &Address) -> u128 {
        self.state
            .delegations
            .delegators_of(account)
            .into_iter()
            .filter(|d| self.state.members.is_approved(d))
            .fold(self.voting_power_of(account), |acc, d| {
                acc.saturating_add(self.voting_power_of(d))
            })
    }

    /// Delegate the caller's vote to an approved member. Only approved
    /// members can delegate.
    pub fn delegate(&mut self, caller: &Address, delegatee: &Address) -> Result<(), GovernanceError> {
        if !self.state.members.is_approved(caller) {
            return Err(GovernanceError::NotMember(caller.clone()));
        }
        let is_member = self.state.members.is_approved(delegatee);
        let previous = self.state.delegations.delegate(caller, delegatee, is_member)?;
        info!(delegator = %caller, delegatee = %delegatee, "vote delegated");
        if let Some(previous) = previous.filter(|p| p != delegatee) {
            self.outbox.push(GovernanceEvent::Undelegated {
                delegator: caller.clone(),
                previous,
            });
        }
        self.outbox.push(GovernanceEvent::Delegated {
            delegator: caller.clone(),
            delegatee: delegatee.clone(),
        });
        Ok(())
    }

    /// Withdraw the caller's delegation. Returns the former delegate.
    pub fn undelegate(&mut self, caller: &Address) -> Option<Address> {
        let previous = self.state.delegations.undelegate(caller)?;
        info!(delegator = %caller, previous = %previous, "delegation withdrawn");
        self.outbox.push(GovernanceEvent::Undelegated {
            delegator: caller.clone(),
            previous: previous.clone(),
        });
        Some(previous)
    }

    pub fn delegate_of(&self, account: &Address) -> Option<&Address> {
        self.state.delegations.delegate_of(account)
    }

    pub fn delegators_of(&self, account: &Address) -> Vec<&Address> {
        self.state.delegations.delegators_of(account)
    }

    // ── Token ledger ─────────────────────────────────────────────────────

    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<TokenAmount, GovernanceError> {
        let balance = self
            .state
            .ledger
            .mint(&self.state.roles, caller, to, amount)?;
        info!(to = %to, %amount, supply = %self.state.ledger.total_supply(), "tokens minted");
        self.outbox.push(GovernanceEvent::Minted {
            to: to.clone(),
            amount,
        });
        Ok(balance)
    }

    /// Set the ledger KYC flag. Requires `KYC_ROLE`. Emits only on change.
    pub fn set_kyc_status(
        &mut self,
        caller: &Address,
        account: &Address,
        approved: bool,
    ) -> Result<(), GovernanceError> {
        let changed = self
            .state
            .ledger
            .set_kyc_status(&self.state.roles, caller, account, approved)?;
        if changed {
            info!(account = %account, approved, "ledger KYC updated");
            self.outbox.push(GovernanceEvent::KycStatusUpdated {
                account: account.clone(),
                approved,
                namespace: KycNamespace::Ledger,
            });
        }
        Ok(())
    }

    /// Move tokens from the caller to `to`.
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), GovernanceError> {
        self.state.ledger.transfer(caller, to, amount)?;
        info!(from = %caller, to = %to, %amount, "tokens transferred");
        self.outbox.push(GovernanceEvent::Transferred {
            from: caller.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.state.ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.state.ledger.total_supply()
    }

    pub fn is_kyc_approved(&self, account: &Address) -> bool {
        self.state.ledger.is_kyc_approved(account)
    }

    /// Non-zero balances in address order.
    pub fn holders(&self) -> Vec<(&Address, TokenAmount)> {
        self.state.ledger.holders()
    }

    // ── Proposals ────────────────────────────────────────────────────────

    /// Open a proposal. The caller must be an approved member with
    /// membership KYC and non-zero voting power.
    pub fn create_proposal(
        &mut self,
        caller: &Address,
        description: impl Into<String>,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        if !self.state.members.is_approved(caller) {
            return Err(GovernanceError::NotMember(caller.clone()));
        }
        if !self.state.members.has_passed_kyc(caller) {
            return Err(GovernanceError::KycRequired(caller.clone()));
        }
        if self.voting_power_of(caller) == 0 {
            return Err(GovernanceError::NoVotingPower(caller.clone()));
        }
        let description = description.into();
        let id = self
            .state
            .proposals
            .create(description.clone(), caller.clone(), now);
        info!(proposal = id, proposer = %caller, start = %now, "proposal created");
        self.outbox.push(GovernanceEvent::ProposalCreated {
            id,
            proposer: caller.clone(),
            description,
            start_time: now,
        });
        Ok(id)
    }

    /// Cast the caller's vote, carrying the power of every direct delegator
    /// who has not voted on this proposal yet. Returns the weight counted.
    pub fn vote(
        &mut self,
        caller: &Address,
        id: ProposalId,
        support: bool,
        now: Timestamp,
    ) -> Result<u128, GovernanceError> {
        let period = self.state.params.voting_period_secs;
        let proposal = self.state.proposals.require(id)?;
        if !self.state.members.is_approved(caller) {
            return Err(GovernanceError::NotMember(caller.clone()));
        }
        if proposal.is_finalized() {
            return Err(GovernanceError::ProposalFinalized(id));
        }
        if proposal.state(now, period) != ProposalState::Open {
            return Err(GovernanceError::VotingWindowClosed {
                proposal: id,
                closed_at: proposal.end_time(period),
            });
        }
        if self.state.proposals.has_voted(caller, id) {
            return Err(GovernanceError::AlreadyVoted {
                voter: caller.clone(),
                proposal: id,
            });
        }
        if let Some(delegate) = self.state.delegations.delegate_of(caller) {
            return Err(GovernanceError::VoteDelegated {
                voter: caller.clone(),
                delegate: delegate.clone(),
            });
        }

        let mut voters = vec![caller.clone()];
        let mut weight = self.voting_power_of(caller);
        for delegator in self.state.delegations.delegators_of(caller) {
            if self.state.proposals.has_voted(delegator, id)
                || !self.state.members.is_approved(delegator)
            {
                continue;
            }
            weight = weight
                .checked_add(self.voting_power_of(delegator))
                .ok_or(GovernanceError::Overflow)?;
            voters.push(delegator.clone());
        }

        self.state.proposals.record_vote(id, &voters, support, weight)?;
        info!(proposal = id, voter = %caller, support, weight, proxied = voters.len() - 1, "vote cast");
        self.outbox.push(GovernanceEvent::Voted {
            proposal: id,
            voter: caller.clone(),
            support,
            weight,
        });
        Ok(weight)
    }

    /// Finalize a proposal whose voting period has elapsed.
    ///
    /// Fails with `VotingPeriodActive` before the window closes and with
    /// `QuorumNotReached` if too few votes were cast. Otherwise the
    /// proposal becomes `Executed` when `for > against` and `Rejected`
    /// when not; both outcomes are terminal and both are `Ok`.
    pub fn execute_proposal(
        &mut self,
        caller: &Address,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalOutcome, GovernanceError> {
        let period = self.state.params.voting_period_secs;
        let proposal = self.state.proposals.require(id)?;
        if proposal.is_finalized() {
            return Err(GovernanceError::ProposalFinalized(id));
        }
        if !proposal.start_time.has_expired(period, now) {
            return Err(GovernanceError::VotingPeriodActive {
                proposal: id,
                ends_at: proposal.end_time(period),
            });
        }
        let threshold = self.quorum_threshold();
        let votes = proposal.total_votes();
        if votes < threshold {
            return Err(GovernanceError::QuorumNotReached { votes, threshold });
        }

        let (for_votes, against_votes) = (proposal.for_votes, proposal.against_votes);
        let elapsed = proposal.start_time.elapsed_since(now);
        let outcome = if for_votes > against_votes {
            ProposalOutcome::Executed
        } else {
            ProposalOutcome::Rejected
        };
        self.state.proposals.finalize(id, outcome)?;
        info!(proposal = id, ?outcome, for_votes, against_votes, threshold, elapsed, "proposal finalized");
        self.outbox.push(match outcome {
            ProposalOutcome::Executed => GovernanceEvent::ProposalExecuted {
                id,
                caller: caller.clone(),
            },
            ProposalOutcome::Rejected => GovernanceEvent::ProposalRejected {
                id,
                caller: caller.clone(),
                for_votes,
                against_votes,
            },
        });
        Ok(outcome)
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.state.proposals.get(id)
    }

    pub fn proposal_at(&self, index: usize) -> Option<&Proposal> {
        self.state.proposals.proposal_at(index)
    }

    pub fn proposal_count(&self) -> usize {
        self.state.proposals.proposal_count()
    }

    pub fn proposal_state(&self, id: ProposalId, now: Timestamp) -> Option<ProposalState> {
        self.state
            .proposals
            .get(id)
            .map(|p| p.state(now, self.state.params.voting_period_secs))
    }

    pub fn has_voted(&self, voter: &Address, id: ProposalId) -> bool {
        self.state.proposals.has_voted(voter, id)
    }

    /// Votes currently required for quorum, from the live supply.
    pub fn quorum_threshold(&self) -> u128 {
        quorum_threshold(
            self.state.params.quorum_percentage,
            self.state.ledger.total_supply(),
        )
    }

    // ── Parameters ───────────────────────────────────────────────────────

    pub fn set_quorum_percentage(&mut self, caller: &Address, pct: u32) -> Result<(), GovernanceError> {
        self.state.roles.require_role(Role::Admin, caller)?;
        GovernanceParams::validate_quorum(pct)
            .map_err(|e| invalid(GovernableParam::QuorumPercentage, e))?;
        self.state.params.quorum_percentage = pct;
        self.param_updated(GovernableParam::QuorumPercentage, pct.to_string());
        Ok(())
    }

    pub fn set_voting_period(&mut self, caller: &Address, secs: u64) -> Result<(), GovernanceError> {
        self.state.roles.require_role(Role::Admin, caller)?;
        GovernanceParams::validate_voting_period(secs)
            .map_err(|e| invalid(GovernableParam::VotingPeriod, e))?;
        self.state.params.voting_period_secs = secs;
        self.param_updated(GovernableParam::VotingPeriod, secs.to_string());
        Ok(())
    }

    pub fn set_vote_weight(
        &mut self,
        caller: &Address,
        formula: VoteWeight,
    ) -> Result<(), GovernanceError> {
        self.state.roles.require_role(Role::Admin, caller)?;
        self.state.params.vote_weight = formula;
        self.param_updated(GovernableParam::VoteWeight, format!("{formula:?}"));
        Ok(())
    }

    pub fn quorum_percentage(&self) -> u32 {
        self.state.params.quorum_percentage
    }

    pub fn voting_period(&self) -> u64 {
        self.state.params.voting_period_secs
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.state.params
    }

    fn param_updated(&mut self, param: GovernableParam, value: String) {
        info!(param = param.name(), value = %value, "parameter updated");
        self.outbox
            .push(GovernanceEvent::ParameterUpdated { param, value });
    }

    // ── Snapshots ────────────────────────────────────────────────────────

    /// Serialize the whole state for persistence.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(&self.state).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    /// Restore an engine from [`GovernanceEngine::save_state`] output.
    pub fn load_state(data: &[u8]) -> Result<Self, GovernanceError> {
        let state: State =
            bincode::deserialize(data).map_err(|e| GovernanceError::Snapshot(e.to_string()))?;
        validate_params(&state.params)?;
        Ok(Self::from_state(state))
    }
}

fn invalid(param: GovernableParam, e: impl std::fmt::Display) -> GovernanceError {
    GovernanceError::InvalidParameter {
        param: param.name(),
        reason: e.to_string(),
    }
}

fn validate_params(params: &GovernanceParams) -> Result<(), GovernanceError> {
    GovernanceParams::validate_quorum(params.quorum_percentage)
        .map_err(|e| invalid(GovernableParam::QuorumPercentage, e))?;
    GovernanceParams::validate_voting_period(params.voting_period_secs)
        .map_err(|e| invalid(GovernableParam::VotingPeriod, e))?;
    Ok(())
}
