//! Voting - single-round proposal voting
//!
//! An owner registers voters and drives a six-phase workflow; registered
//! voters submit proposals and cast exactly one vote each; the tally picks
//! the proposal with the most votes, lowest index on ties.
//!
//! Key principles:
//! - Every call names its caller explicitly (no ambient identity)
//! - Access check, then phase check, then mutation; a rejected call changes nothing
//! - Phases only move forward, one owner-triggered step at a time
//! - Persisted state is fingerprinted and re-validated on load

pub mod identity;
pub mod persistence;
pub mod serialization;
pub mod voting;

pub use identity::Principal;
pub use voting::{
    Proposal, ProposalId, VotingError, VotingEvent, VotingService, VotingSession, WorkflowStatus,
};
