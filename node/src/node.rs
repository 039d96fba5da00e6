//! The governance node: the serialization boundary around the engine.
//!
//! Requests are applied one at a time under a single lock. The clock is
//! read once per request and never allowed to move backwards. Events are
//! drained while the lock is held and fanned out after it is released, so
//! subscribers only ever see committed changes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, Instrument};

use kycdao_governance::{GovernanceEngine, GovernanceError, GovernanceEvent};
use kycdao_types::{Clock, Role, Timestamp};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::event_bus::EventBus;
use crate::request::{Reply, Request, Response};
use crate::tracing_spans::{proposal_execute_span, request_span, snapshot_span};

struct Inner {
    engine: GovernanceEngine,
    /// Latest time handed to the engine.
    last_now: Timestamp,
}

impl Inner {
    /// Read `clock` once, clamped to never precede an earlier reading.
    fn tick(&mut self, clock: &dyn Clock) -> Timestamp {
        let now = clock.now().max(self.last_now);
        self.last_now = now;
        now
    }
}

pub struct GovernanceNode {
    inner: Arc<Mutex<Inner>>,
    events: Arc<RwLock<EventBus>>,
    clock: Arc<dyn Clock>,
    snapshot_path: Option<PathBuf>,
    seq: AtomicU64,
}

impl GovernanceNode {
    /// Load state from the configured snapshot if it exists, otherwise
    /// bootstrap a fresh state from the configuration.
    pub async fn new(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        let existing = match &config.snapshot_path {
            Some(path) => tokio::fs::try_exists(path).await?.then_some(path),
            None => None,
        };
        let engine = match existing {
            Some(path) => load_snapshot(path).await?,
            None => bootstrap(&config)?,
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                engine,
                last_now: Timestamp::EPOCH,
            })),
            events: Arc::new(RwLock::new(EventBus::new())),
            clock,
            snapshot_path: config.snapshot_path,
            seq: AtomicU64::new(0),
        })
    }

    /// Register a listener for committed governance events.
    pub async fn subscribe(&self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.events.write().await.subscribe(listener);
    }

    /// Apply one request atomically.
    pub async fn handle(&self, request: Request) -> Response {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let span = request_span(request.name(), seq);
        async move {
            let op = request.name();
            let (result, events) = {
                let mut inner = self.inner.lock().await;
                let now = inner.tick(self.clock.as_ref());
                let result = dispatch(&mut inner.engine, request, now);
                (result, inner.engine.drain_events())
            };

            if let Err(e) = &result {
                debug!(op, kind = %e.kind(), error = %e, "request rejected");
            }
            let bus = self.events.read().await;
            for event in &events {
                bus.emit(event);
            }
            Response::from(result)
        }
        .instrument(span)
        .await
    }

    /// Parse one JSON request and apply it.
    pub async fn handle_json(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                debug!(error = %e, "malformed request");
                Response::invalid_request(format!("malformed request: {e}"))
            }
        }
    }

    /// Write the current state to the configured snapshot path.
    ///
    /// Returns the path written, or `None` when no path is configured.
    pub async fn save_snapshot(&self) -> Result<Option<PathBuf>, NodeError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(None);
        };
        let bytes = self.inner.lock().await.engine.save_state()?;
        async {
            let tmp = path.with_extension("tmp");
            tokio::fs::write(&tmp, &bytes).await?;
            tokio::fs::rename(&tmp, path).await?;
            info!(bytes = bytes.len(), "snapshot saved");
            Ok::<_, NodeError>(())
        }
        .instrument(snapshot_span("save", path))
        .await?;
        Ok(Some(path.clone()))
    }

    /// Run a read-only closure against the engine.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&GovernanceEngine) -> R) -> R {
        f(&self.inner.lock().await.engine)
    }
}

fn bootstrap(config: &NodeConfig) -> Result<GovernanceEngine, NodeError> {
    let admin = &config.genesis_admin;
    let mut engine = GovernanceEngine::new(admin.clone(), config.params.clone())?;
    for minter in &config.minters {
        engine.grant_role(admin, Role::Minter, minter)?;
    }
    for officer in &config.kyc_officers {
        engine.grant_role(admin, Role::Kyc, officer)?;
    }
    // Bootstrap happens before anyone can subscribe.
    engine.drain_events();
    info!(
        admin = %admin,
        minters = config.minters.len(),
        kyc_officers = config.kyc_officers.len(),
        "bootstrapped fresh governance state"
    );
    Ok(engine)
}

async fn load_snapshot(path: &Path) -> Result<GovernanceEngine, NodeError> {
    async {
        let bytes = tokio::fs::read(path).await?;
        let engine = GovernanceEngine::load_state(&bytes)
            .map_err(|e| NodeError::Snapshot(format!("{}: {e}", path.display())))?;
        info!(
            bytes = bytes.len(),
            members = engine.member_count(),
            proposals = engine.proposal_count(),
            "snapshot loaded"
        );
        Ok::<_, NodeError>(engine)
    }
    .instrument(snapshot_span("load", path))
    .await
}

fn dispatch(
    engine: &mut GovernanceEngine,
    request: Request,
    now: Timestamp,
) -> Result<Reply, GovernanceError> {
    let reply = match request {
        Request::GrantRole {
            caller,
            role,
            account,
        } => Reply::Bool(engine.grant_role(&caller, role, &account)?),
        Request::RevokeRole {
            caller,
            role,
            account,
        } => Reply::Bool(engine.revoke_role(&caller, role, &account)?),
        Request::RenounceRole { caller, role } => Reply::Bool(engine.renounce_role(&caller, role)?),
        Request::SetRoleAdmin {
            caller,
            role,
            admin_role,
        } => {
            engine.set_role_admin(&caller, role, admin_role)?;
            Reply::Unit
        }
        Request::HasRole { role, account } => Reply::Bool(engine.has_role(role, &account)),
        Request::RoleMembers { role } => {
            Reply::Addresses(engine.role_members(role).into_iter().cloned().collect())
        }

        Request::AddMember {
            caller,
            account,
            base_voting_weight,
        } => {
            engine.add_member(&caller, &account, base_voting_weight)?;
            Reply::Unit
        }
        Request::RemoveMember { caller, account } => {
            engine.remove_member(&caller, &account)?;
            Reply::Unit
        }
        Request::UpdateKycStatus {
            caller,
            account,
            passed,
        } => {
            engine.update_kyc_status(&caller, &account, passed)?;
            Reply::Unit
        }
        Request::IsMember { account } => Reply::Bool(engine.is_member(&account)),
        Request::Member { account } => Reply::Member(engine.member(&account).cloned()),
        Request::MemberAt { index } => Reply::Member(engine.member_at(index).cloned()),
        Request::MemberCount => Reply::Count(engine.member_count()),
        Request::ActiveMembers => {
            Reply::Addresses(engine.active_members().into_iter().cloned().collect())
        }

        Request::VotingPowerOf { account } => Reply::Weight(engine.voting_power_of(&account)),
        Request::DelegatedVotingPowerOf { account } => {
            Reply::Weight(engine.delegated_voting_power_of(&account))
        }
        Request::Delegate { caller, delegatee } => {
            engine.delegate(&caller, &delegatee)?;
            Reply::Unit
        }
        Request::Undelegate { caller } => Reply::Address(engine.undelegate(&caller)),
        Request::DelegateOf { account } => Reply::Address(engine.delegate_of(&account).cloned()),
        Request::DelegatorsOf { account } => Reply::Addresses(
            engine
                .delegators_of(&account)
                .into_iter()
                .cloned()
                .collect(),
        ),

        Request::Mint { caller, to, amount } => Reply::Amount(engine.mint(&caller, &to, amount)?),
        Request::SetKycStatus {
            caller,
            account,
            approved,
        } => {
            engine.set_kyc_status(&caller, &account, approved)?;
            Reply::Unit
        }
        Request::Transfer { caller, to, amount } => {
            engine.transfer(&caller, &to, amount)?;
            Reply::Unit
        }
        Request::BalanceOf { account } => Reply::Amount(engine.balance_of(&account)),
        Request::TotalSupply => Reply::Amount(engine.total_supply()),
        Request::IsKycApproved { account } => Reply::Bool(engine.is_kyc_approved(&account)),
        Request::Holders => Reply::Holders(
            engine
                .holders()
                .into_iter()
                .map(|(a, b)| (a.clone(), b))
                .collect(),
        ),

        Request::CreateProposal {
            caller,
            description,
        } => Reply::Id(engine.create_proposal(&caller, description, now)?),
        Request::Vote {
            caller,
            proposal,
            support,
        } => Reply::Weight(engine.vote(&caller, proposal, support, now)?),
        Request::ExecuteProposal { caller, proposal } => {
            let _span = proposal_execute_span(proposal).entered();
            Reply::Outcome(engine.execute_proposal(&caller, proposal, now)?)
        }
        Request::Proposal { proposal } => Reply::Proposal(engine.proposal(proposal).cloned()),
        Request::ProposalAt { index } => Reply::Proposal(engine.proposal_at(index).cloned()),
        Request::ProposalCount => Reply::Count(engine.proposal_count()),
        Request::ProposalState { proposal } => {
            Reply::ProposalState(engine.proposal_state(proposal, now))
        }
        Request::HasVoted { voter, proposal } => Reply::Bool(engine.has_voted(&voter, proposal)),
        Request::QuorumThreshold => Reply::Weight(engine.quorum_threshold()),

        Request::SetQuorumPercentage {
            caller,
            quorum_percentage,
        } => {
            engine.set_quorum_percentage(&caller, quorum_percentage)?;
            Reply::Unit
        }
        Request::SetVotingPeriod {
            caller,
            voting_period_secs,
        } => {
            engine.set_voting_period(&caller, voting_period_secs)?;
            Reply::Unit
        }
        Request::SetVoteWeight {
            caller,
            vote_weight,
        } => {
            engine.set_vote_weight(&caller, vote_weight)?;
            Reply::Unit
        }
        Request::QuorumPercentage => Reply::Percentage(engine.quorum_percentage()),
        Request::VotingPeriod => Reply::Seconds(engine.voting_period()),
        Request::Params => Reply::Params(engine.params().clone()),
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    #[test]
    fn tick_never_moves_backwards() {
        let mut inner = Inner {
            engine: bootstrap(&NodeConfig::default()).unwrap(),
            last_now: Timestamp::EPOCH,
        };
        assert_eq!(inner.tick(&FixedClock(100)), Timestamp::new(100));
        assert_eq!(inner.tick(&FixedClock(40)), Timestamp::new(100));
        assert_eq!(inner.tick(&FixedClock(150)), Timestamp::new(150));
    }
}
