//! Voting error taxonomy and collaborator seams.
//!
//! Notification delivery and session storage are external collaborators.
//! They sit behind [`EventSink`] and [`SessionStore`] so the core and the
//! service can be tested with the in-memory doubles in `mock`.

use super::events::VotingEvent;
use super::proposals::ProposalId;
use super::session::VotingSession;
use super::workflow::WorkflowStatus;
use crate::identity::Principal;
use async_trait::async_trait;

/// Result type for voting operations
pub type VotingResult<T> = Result<T, VotingError>;

/// Rejections. A rejected call leaves every registry and the phase unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VotingError {
    #[error("Caller is not the owner")]
    NotOwner,

    #[error("Caller is not a registered voter")]
    NotAVoter,

    #[error("Wrong phase: expected {expected}, current phase is {actual}")]
    WrongPhase {
        expected: WorkflowStatus,
        actual: WorkflowStatus,
    },

    #[error("Voter already registered: {0}")]
    AlreadyRegistered(Principal),

    #[error("Proposal description cannot be empty")]
    EmptyProposal,

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Voter has already voted")]
    AlreadyVoted,

    #[error("Votes have not been tallied yet")]
    NotTalliedYet,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Session storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Unsupported schema version: {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("Integrity check failed: stored fingerprint {stored}, computed {computed}")]
    Integrity { stored: String, computed: String },

    #[error("Corrupt session state: {0}")]
    Corrupt(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Receives each notification exactly once, after its mutation commits.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &VotingEvent);
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: &VotingEvent) {
        (**self).emit(event)
    }
}

/// Durable home of a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, `None` if nothing has been stored yet.
    async fn load(&self) -> StoreResult<Option<VotingSession>>;

    /// Replace the stored session.
    async fn save(&self, session: &VotingSession) -> StoreResult<()>;
}
