//! Workflow state machine.
//!
//! The six phases advance strictly forward, one step per owner-triggered
//! transition, and never regress or repeat. Every phase-gated operation is
//! listed in [`Operation`], and [`Operation::required_phase`] is the only
//! place that maps an operation to the phase where it is legal.

use super::traits::{VotingError, VotingResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a voting session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum WorkflowStatus {
    /// Owner is adding voters (initial phase).
    #[default]
    RegisteringVoters,
    /// Registered voters may submit proposals.
    ProposalsRegistrationStarted,
    /// Proposal list is frozen, voting not yet open.
    ProposalsRegistrationEnded,
    /// Registered voters may cast their single vote.
    VotingSessionStarted,
    /// Votes are frozen, awaiting tally.
    VotingSessionEnded,
    /// Winner computed (terminal).
    VotesTallied,
}

impl WorkflowStatus {
    /// All phases in lifecycle order.
    pub const ALL: [WorkflowStatus; 6] = [
        WorkflowStatus::RegisteringVoters,
        WorkflowStatus::ProposalsRegistrationStarted,
        WorkflowStatus::ProposalsRegistrationEnded,
        WorkflowStatus::VotingSessionStarted,
        WorkflowStatus::VotingSessionEnded,
        WorkflowStatus::VotesTallied,
    ];

    /// Stable integer index (0..=5) carried by status-change notifications.
    pub fn index(self) -> u8 {
        match self {
            WorkflowStatus::RegisteringVoters => 0,
            WorkflowStatus::ProposalsRegistrationStarted => 1,
            WorkflowStatus::ProposalsRegistrationEnded => 2,
            WorkflowStatus::VotingSessionStarted => 3,
            WorkflowStatus::VotingSessionEnded => 4,
            WorkflowStatus::VotesTallied => 5,
        }
    }

    /// Phase for an integer index, if in range.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Human-readable phase description.
    pub fn description(self) -> &'static str {
        match self {
            WorkflowStatus::RegisteringVoters => "registering voters",
            WorkflowStatus::ProposalsRegistrationStarted => "proposals registration started",
            WorkflowStatus::ProposalsRegistrationEnded => "proposals registration ended",
            WorkflowStatus::VotingSessionStarted => "voting session started",
            WorkflowStatus::VotingSessionEnded => "voting session ended",
            WorkflowStatus::VotesTallied => "votes tallied",
        }
    }

    /// Successor phase, `None` for the terminal phase.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Whether the lifecycle is finished.
    pub fn is_terminal(self) -> bool {
        self == WorkflowStatus::VotesTallied
    }

    /// Fails with `WrongPhase` unless `op` is legal in this phase.
    pub fn check(self, op: Operation) -> VotingResult<()> {
        let expected = op.required_phase();
        if self == expected {
            Ok(())
        } else {
            Err(VotingError::WrongPhase {
                expected,
                actual: self,
            })
        }
    }

    /// Applies a phase transition, returning the new phase.
    ///
    /// Each trigger is legal only from its unique predecessor phase, so every
    /// transition happens at most once per session.
    pub fn transition(self, transition: PhaseTransition) -> VotingResult<Self> {
        self.check(Operation::Advance(transition))?;
        Ok(transition.target())
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Owner-triggered phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseTransition {
    /// 0 -> 1, appends the GENESIS proposal.
    StartProposalsRegistering,
    /// 1 -> 2
    EndProposalsRegistering,
    /// 2 -> 3
    StartVotingSession,
    /// 3 -> 4
    EndVotingSession,
    /// 4 -> 5, computes the winner.
    TallyVotes,
}

impl PhaseTransition {
    /// All transitions in lifecycle order.
    pub const ALL: [PhaseTransition; 5] = [
        PhaseTransition::StartProposalsRegistering,
        PhaseTransition::EndProposalsRegistering,
        PhaseTransition::StartVotingSession,
        PhaseTransition::EndVotingSession,
        PhaseTransition::TallyVotes,
    ];

    /// Phase the transition leaves.
    pub fn source(self) -> WorkflowStatus {
        match self {
            PhaseTransition::StartProposalsRegistering => WorkflowStatus::RegisteringVoters,
            PhaseTransition::EndProposalsRegistering => {
                WorkflowStatus::ProposalsRegistrationStarted
            }
            PhaseTransition::StartVotingSession => WorkflowStatus::ProposalsRegistrationEnded,
            PhaseTransition::EndVotingSession => WorkflowStatus::VotingSessionStarted,
            PhaseTransition::TallyVotes => WorkflowStatus::VotingSessionEnded,
        }
    }

    /// Phase the transition enters.
    pub fn target(self) -> WorkflowStatus {
        match self {
            PhaseTransition::StartProposalsRegistering => {
                WorkflowStatus::ProposalsRegistrationStarted
            }
            PhaseTransition::EndProposalsRegistering => WorkflowStatus::ProposalsRegistrationEnded,
            PhaseTransition::StartVotingSession => WorkflowStatus::VotingSessionStarted,
            PhaseTransition::EndVotingSession => WorkflowStatus::VotingSessionEnded,
            PhaseTransition::TallyVotes => WorkflowStatus::VotesTallied,
        }
    }
}

/// Phase-gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddVoter,
    AddProposal,
    SetVote,
    Advance(PhaseTransition),
}

impl Operation {
    /// The one phase in which this operation is legal.
    pub fn required_phase(self) -> WorkflowStatus {
        match self {
            Operation::AddVoter => WorkflowStatus::RegisteringVoters,
            Operation::AddProposal => WorkflowStatus::ProposalsRegistrationStarted,
            Operation::SetVote => WorkflowStatus::VotingSessionStarted,
            Operation::Advance(transition) => transition.source(),
        }
    }
}
