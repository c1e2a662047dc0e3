//! Concurrent voting service.
//!
//! One writer at a time: every mutating call takes the session lock, runs
//! against a working copy, persists it through the optional store, then
//! commits it. Readers never take the lock; they evaluate against the last
//! committed snapshot published on a `watch` channel.
//!
//! Events go to the sink while the lock is still held, so listeners see them
//! in exactly the order the mutations committed.

use super::events::VotingEvent;
use super::proposals::{Proposal, ProposalId};
use super::session::VotingSession;
use super::traits::{EventSink, SessionStore, VotingResult};
use super::voters::Voter;
use super::workflow::{PhaseTransition, WorkflowStatus};
use crate::identity::Principal;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

/// Event sink that writes structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &VotingEvent) {
        match event {
            VotingEvent::VoterRegistered { voter } => {
                info!(voter = %voter, "voter registered");
            }
            VotingEvent::ProposalRegistered { proposal_id } => {
                info!(proposal_id, "proposal registered");
            }
            VotingEvent::Voted { voter, proposal_id } => {
                info!(voter = %voter, proposal_id, "vote cast");
            }
            VotingEvent::WorkflowStatusChange { previous, current } => {
                info!(
                    from = previous.index(),
                    to = current.index(),
                    phase = %current,
                    "workflow status changed"
                );
            }
        }
    }
}

/// Shared, serialized access to one voting session.
pub struct VotingService<E: EventSink> {
    session: Mutex<Arc<VotingSession>>,
    snapshots: watch::Sender<Arc<VotingSession>>,
    store: Option<Arc<dyn SessionStore>>,
    sink: E,
}

impl<E: EventSink> VotingService<E> {
    /// Wrap an in-memory session.
    pub fn new(session: VotingSession, sink: E) -> Self {
        let session = Arc::new(session);
        let (snapshots, _) = watch::channel(session.clone());
        Self {
            session: Mutex::new(session),
            snapshots,
            store: None,
            sink,
        }
    }

    /// Persist every committed mutation to `store`.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Open the session held by `store`, `None` if the store is empty.
    pub async fn open(store: Arc<dyn SessionStore>, sink: E) -> VotingResult<Option<Self>> {
        let Some(session) = store.load().await? else {
            return Ok(None);
        };
        debug!(
            owner = %session.owner(),
            phase = %session.workflow_status(),
            "session loaded"
        );
        Ok(Some(Self::new(session, sink).with_store(store)))
    }

    /// Start a fresh session owned by `owner` and write it to `store`.
    pub async fn create(
        store: Arc<dyn SessionStore>,
        owner: Principal,
        sink: E,
    ) -> VotingResult<Self> {
        let session = VotingSession::new(owner);
        store.save(&session).await?;
        info!(owner = %session.owner(), "voting session created");
        Ok(Self::new(session, sink).with_store(store))
    }

    /// Latest committed state.
    pub fn snapshot(&self) -> Arc<VotingSession> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every commit.
    pub fn subscribe(&self) -> watch::Receiver<Arc<VotingSession>> {
        self.snapshots.subscribe()
    }

    /// Committed snapshots as a stream, starting with the current one.
    pub fn snapshot_stream(&self) -> WatchStream<Arc<VotingSession>> {
        WatchStream::new(self.subscribe())
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    async fn commit<F>(&self, action: &'static str, op: F) -> VotingResult<VotingEvent>
    where
        F: FnOnce(&mut VotingSession) -> VotingResult<VotingEvent>,
    {
        let mut guard = self.session.lock().await;
        let mut working = VotingSession::clone(&guard);

        let event = match op(&mut working) {
            Ok(event) => event,
            Err(err) => {
                debug!(action, error = %err, "call rejected");
                return Err(err);
            }
        };

        if let Some(store) = &self.store {
            if let Err(err) = store.save(&working).await {
                warn!(action, error = %err, "failed to persist session, call rejected");
                return Err(err.into());
            }
        }

        let committed = Arc::new(working);
        *guard = committed.clone();
        self.snapshots.send_replace(committed);
        self.sink.emit(&event);
        Ok(event)
    }

    // ---- Mutations ----

    pub async fn add_voter(&self, caller: &Principal, voter: Principal) -> VotingResult<VotingEvent> {
        self.commit("add_voter", |s| s.add_voter(caller, voter))
            .await
    }

    pub async fn add_proposal(
        &self,
        caller: &Principal,
        description: impl Into<String>,
    ) -> VotingResult<VotingEvent> {
        let description = description.into();
        self.commit("add_proposal", |s| s.add_proposal(caller, description))
            .await
    }

    pub async fn set_vote(&self, caller: &Principal, id: ProposalId) -> VotingResult<VotingEvent> {
        self.commit("set_vote", |s| s.set_vote(caller, id)).await
    }

    pub async fn advance(
        &self,
        caller: &Principal,
        transition: PhaseTransition,
    ) -> VotingResult<VotingEvent> {
        self.commit("advance", |s| s.advance(caller, transition))
            .await
    }

    pub async fn start_proposals_registering(&self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::StartProposalsRegistering)
            .await
    }

    pub async fn end_proposals_registering(&self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::EndProposalsRegistering)
            .await
    }

    pub async fn start_voting_session(&self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::StartVotingSession)
            .await
    }

    pub async fn end_voting_session(&self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::EndVotingSession)
            .await
    }

    pub async fn tally_votes(&self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::TallyVotes).await
    }

    // ---- Reads (lock-free snapshots) ----

    pub fn owner(&self) -> Principal {
        self.snapshot().owner().clone()
    }

    pub fn workflow_status(&self) -> WorkflowStatus {
        self.snapshot().workflow_status()
    }

    pub fn winning_proposal_id(&self) -> VotingResult<ProposalId> {
        self.snapshot().winning_proposal_id()
    }

    pub fn get_voter(&self, caller: &Principal, voter: &Principal) -> VotingResult<Voter> {
        self.snapshot().get_voter(caller, voter)
    }

    pub fn get_one_proposal(&self, caller: &Principal, id: ProposalId) -> VotingResult<Proposal> {
        self.snapshot().get_one_proposal(caller, id).cloned()
    }

    pub fn proposals(&self, caller: &Principal) -> VotingResult<Vec<Proposal>> {
        self.snapshot().proposals(caller).map(<[Proposal]>::to_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::mock::{MemoryStore, RecordingSink};
    use crate::voting::traits::{StoreError, VotingError};

    fn p(id: &str) -> Principal {
        Principal::new(id).unwrap()
    }

    fn service() -> VotingService<RecordingSink> {
        VotingService::new(VotingSession::new(p("owner")), RecordingSink::new())
    }

    #[tokio::test]
    async fn test_events_emitted_only_on_success() {
        let service = service();
        service.add_voter(&p("owner"), p("alice")).await.unwrap();
        assert!(service.add_voter(&p("owner"), p("alice")).await.is_err());
        assert!(service.add_voter(&p("alice"), p("bob")).await.is_err());

        assert_eq!(
            service.sink().events(),
            vec![VotingEvent::VoterRegistered { voter: p("alice") }]
        );
    }

    #[tokio::test]
    async fn test_snapshot_reflects_latest_commit() {
        let service = service();
        let before = service.snapshot();

        service.start_proposals_registering(&p("owner")).await.unwrap();

        assert_eq!(before.workflow_status(), WorkflowStatus::RegisteringVoters);
        assert_eq!(
            service.workflow_status(),
            WorkflowStatus::ProposalsRegistrationStarted
        );
        assert_eq!(service.snapshot().proposal_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let service = service();
        let mut rx = service.subscribe();

        service.add_voter(&p("owner"), p("alice")).await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().voter_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_stream_yields_current_then_committed() {
        use futures::StreamExt;

        let service = service();
        let mut snapshots = service.snapshot_stream();

        let initial = snapshots.next().await.unwrap();
        assert_eq!(initial.voter_count(), 0);

        service.add_voter(&p("owner"), p("alice")).await.unwrap();
        let committed = snapshots.next().await.unwrap();
        assert_eq!(committed.voter_count(), 1);
        assert!(Arc::ptr_eq(&committed, &service.snapshot()));
    }

    #[tokio::test]
    async fn test_store_failure_rejects_call_without_commit() {
        let store = MemoryStore::new();
        let service = service().with_store(Arc::new(store.clone()));

        service.add_voter(&p("owner"), p("alice")).await.unwrap();
        assert_eq!(store.save_count(), 1);

        store.set_fail_saves(true);
        let err = service.add_voter(&p("owner"), p("bob")).await.unwrap_err();
        assert!(matches!(err, VotingError::Store(StoreError::Io(_))));

        assert_eq!(service.snapshot().voter_count(), 1);
        assert_eq!(service.sink().len(), 1);
        assert_eq!(store.stored().unwrap().voter_count(), 1);
    }

    #[tokio::test]
    async fn test_open_returns_none_for_empty_store() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        let opened = VotingService::open(store, RecordingSink::new())
            .await
            .unwrap();
        assert!(opened.is_none());
    }

    #[tokio::test]
    async fn test_create_then_open_resumes_state() {
        let store = Arc::new(MemoryStore::new());
        let service = VotingService::create(store.clone(), p("owner"), LogSink)
            .await
            .unwrap();
        service.add_voter(&p("owner"), p("alice")).await.unwrap();
        drop(service);

        let reopened = VotingService::open(store, LogSink).await.unwrap().unwrap();
        assert_eq!(reopened.owner(), p("owner"));
        assert!(reopened.get_voter(&p("alice"), &p("alice")).unwrap().is_registered);
    }

    #[tokio::test]
    async fn test_concurrent_votes_are_serialized() {
        let service = Arc::new(service());
        let owner = p("owner");
        let voters: Vec<Principal> = (0..32).map(|i| p(&format!("voter{}", i))).collect();
        for v in &voters {
            service.add_voter(&owner, v.clone()).await.unwrap();
        }
        service.start_proposals_registering(&owner).await.unwrap();
        service.add_proposal(&voters[0], "A").await.unwrap();
        service.add_proposal(&voters[0], "B").await.unwrap();
        service.end_proposals_registering(&owner).await.unwrap();
        service.start_voting_session(&owner).await.unwrap();

        let mut handles = Vec::new();
        for (i, v) in voters.iter().cloned().enumerate() {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                // Every voter tries twice; only the first attempt may land.
                let first = service.set_vote(&v, 1 + i % 2).await;
                let second = service.set_vote(&v, 1).await;
                (first.is_ok(), second)
            }));
        }
        for handle in handles {
            let (first_ok, second) = handle.await.unwrap();
            assert!(first_ok);
            assert_eq!(second, Err(VotingError::AlreadyVoted));
        }

        let snapshot = service.snapshot();
        let total: u64 = snapshot
            .proposals(&voters[0])
            .unwrap()
            .iter()
            .map(|p| p.vote_count)
            .sum();
        assert_eq!(total, 32);
        assert!(snapshot.validate().is_ok());
    }
}
