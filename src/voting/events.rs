//! Notifications emitted by successful calls.

use super::proposals::ProposalId;
use super::workflow::WorkflowStatus;
use crate::identity::Principal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One notification per successful mutating call, in commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingEvent {
    VoterRegistered {
        voter: Principal,
    },
    ProposalRegistered {
        proposal_id: ProposalId,
    },
    Voted {
        voter: Principal,
        proposal_id: ProposalId,
    },
    WorkflowStatusChange {
        previous: WorkflowStatus,
        current: WorkflowStatus,
    },
}

impl VotingEvent {
    /// Event name as published to listeners.
    pub fn name(&self) -> &'static str {
        match self {
            VotingEvent::VoterRegistered { .. } => "VoterRegistered",
            VotingEvent::ProposalRegistered { .. } => "ProposalRegistered",
            VotingEvent::Voted { .. } => "Voted",
            VotingEvent::WorkflowStatusChange { .. } => "WorkflowStatusChange",
        }
    }

    /// `(previous, new)` phase indices for a status change.
    pub fn status_indices(&self) -> Option<(u8, u8)> {
        match self {
            VotingEvent::WorkflowStatusChange { previous, current } => {
                Some((previous.index(), current.index()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for VotingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VotingEvent::VoterRegistered { voter } => write!(f, "VoterRegistered({})", voter),
            VotingEvent::ProposalRegistered { proposal_id } => {
                write!(f, "ProposalRegistered({})", proposal_id)
            }
            VotingEvent::Voted { voter, proposal_id } => {
                write!(f, "Voted({}, {})", voter, proposal_id)
            }
            VotingEvent::WorkflowStatusChange { previous, current } => write!(
                f,
                "WorkflowStatusChange({}, {})",
                previous.index(),
                current.index()
            ),
        }
    }
}
