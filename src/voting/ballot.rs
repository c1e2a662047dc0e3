//! Voting engine.
//!
//! One vote per registered voter, cast only while the voting session is
//! open, never changed or retracted.

use super::events::VotingEvent;
use super::proposals::{ProposalId, ProposalRegistry};
use super::traits::{VotingError, VotingResult};
use super::voters::VoterRegistry;
use super::workflow::{Operation, WorkflowStatus};
use crate::identity::Principal;

/// Cast `caller`'s vote for `proposal_id`.
///
/// Checks, in order, each short-circuiting:
/// 1. caller is registered (`NotAVoter`)
/// 2. voting session is open (`WrongPhase`)
/// 3. caller has not voted (`AlreadyVoted`)
/// 4. proposal exists (`ProposalNotFound`)
///
/// Both registries are updated only after every check has passed.
pub fn cast_vote(
    status: WorkflowStatus,
    voters: &mut VoterRegistry,
    proposals: &mut ProposalRegistry,
    caller: &Principal,
    proposal_id: ProposalId,
) -> VotingResult<VotingEvent> {
    let voter = voters.get(caller);
    if !voter.is_registered {
        return Err(VotingError::NotAVoter);
    }
    status.check(Operation::SetVote)?;
    if voter.has_voted {
        return Err(VotingError::AlreadyVoted);
    }
    if !proposals.contains(proposal_id) {
        return Err(VotingError::ProposalNotFound(proposal_id));
    }

    voters.record_vote(caller, proposal_id)?;
    proposals.increment(proposal_id)?;

    Ok(VotingEvent::Voted {
        voter: caller.clone(),
        proposal_id,
    })
}
