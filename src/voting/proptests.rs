//! Property-based tests for the voting session
//!
//! Random call sequences from a small principal pool, checking after every
//! call:
//! - Monotonicity: the phase only moves forward, one step at a time
//! - Atomicity: a rejected call leaves the session unchanged
//! - Consistency: vote counts match the voters who chose each proposal
//! - Tie break: the winner is the lowest index with the maximum count

use super::{
    session::VotingSession,
    workflow::{PhaseTransition, WorkflowStatus},
    VotingError, VotingEvent,
};
use crate::identity::Principal;
use proptest::prelude::*;

const POOL: [&str; 6] = ["owner", "v0", "v1", "v2", "v3", "outsider"];

fn principal(i: usize) -> Principal {
    Principal::new(POOL[i % POOL.len()]).unwrap()
}

#[derive(Debug, Clone)]
enum Call {
    AddVoter { caller: usize, target: usize },
    AddProposal { caller: usize, empty: bool },
    SetVote { caller: usize, proposal: usize },
    Advance { caller: usize, transition: usize },
}

fn call_strategy() -> impl Strategy<Value = Call> {
    prop_oneof![
        (0..6usize, 0..6usize).prop_map(|(caller, target)| Call::AddVoter { caller, target }),
        (0..6usize, any::<bool>()).prop_map(|(caller, empty)| Call::AddProposal { caller, empty }),
        (0..6usize, 0..6usize).prop_map(|(caller, proposal)| Call::SetVote { caller, proposal }),
        // Bias towards the owner so sequences actually progress.
        (prop_oneof![3 => Just(0usize), 1 => 1..6usize], 0..5usize)
            .prop_map(|(caller, transition)| Call::Advance { caller, transition }),
    ]
}

fn apply(session: &mut VotingSession, call: &Call) -> Result<VotingEvent, VotingError> {
    match *call {
        Call::AddVoter { caller, target } => {
            session.add_voter(&principal(caller), principal(target))
        }
        Call::AddProposal { caller, empty } => {
            let text = if empty { "" } else { "proposal" };
            session.add_proposal(&principal(caller), text)
        }
        Call::SetVote { caller, proposal } => session.set_vote(&principal(caller), proposal),
        Call::Advance { caller, transition } => {
            session.advance(&principal(caller), PhaseTransition::ALL[transition])
        }
    }
}

proptest! {
    /// Property test: every call either commits exactly one step of progress
    /// or leaves the session byte-for-byte unchanged
    #[test]
    fn prop_calls_are_atomic_and_monotonic(
        calls in proptest::collection::vec(call_strategy(), 0..80)
    ) {
        let mut session = VotingSession::new(principal(0));
        let mut visited = vec![session.workflow_status()];

        for call in &calls {
            let before = session.clone();
            match apply(&mut session, call) {
                Ok(VotingEvent::WorkflowStatusChange { previous, current }) => {
                    prop_assert_eq!(previous, before.workflow_status());
                    prop_assert_eq!(Some(current), previous.next());
                    visited.push(current);
                }
                Ok(_) => {
                    prop_assert_eq!(session.workflow_status(), before.workflow_status());
                }
                Err(_) => {
                    prop_assert_eq!(&session, &before);
                }
            }
            prop_assert!(session.validate().is_ok(), "{:?}", session.validate());
        }

        // Phases visited form a prefix of 0,1,2,3,4,5 with no repeats.
        let expected: Vec<WorkflowStatus> =
            WorkflowStatus::ALL.iter().copied().take(visited.len()).collect();
        prop_assert_eq!(visited, expected);
    }

    /// Property test: a voter's second vote is always rejected
    #[test]
    fn prop_second_vote_rejected(first in 0usize..3, second in 0usize..10) {
        let owner = principal(0);
        let voter = principal(1);
        let mut session = VotingSession::new(owner.clone());
        session.add_voter(&owner, voter.clone()).unwrap();
        session.start_proposals_registering(&owner).unwrap();
        session.add_proposal(&voter, "a").unwrap();
        session.add_proposal(&voter, "b").unwrap();
        session.end_proposals_registering(&owner).unwrap();
        session.start_voting_session(&owner).unwrap();

        session.set_vote(&voter, first).unwrap();
        prop_assert_eq!(session.set_vote(&voter, second), Err(VotingError::AlreadyVoted));
    }

    /// Property test: tally picks the lowest index among tied maxima
    #[test]
    fn prop_tally_lowest_index_of_max(choices in proptest::collection::vec(0usize..5, 0..40)) {
        let owner = principal(0);
        let mut session = VotingSession::new(owner.clone());
        let voters: Vec<Principal> = (0..choices.len())
            .map(|i| Principal::new(format!("voter-{}", i)).unwrap())
            .collect();
        for v in &voters {
            session.add_voter(&owner, v.clone()).unwrap();
        }
        session.start_proposals_registering(&owner).unwrap();
        let proposer = voters.first().cloned();
        if let Some(proposer) = &proposer {
            for i in 1..5 {
                session.add_proposal(proposer, format!("proposal {}", i)).unwrap();
            }
        }
        session.end_proposals_registering(&owner).unwrap();
        session.start_voting_session(&owner).unwrap();
        for (v, &choice) in voters.iter().zip(&choices) {
            session.set_vote(v, choice).unwrap();
        }
        session.end_voting_session(&owner).unwrap();
        session.tally_votes(&owner).unwrap();

        let mut counts = [0u64; 5];
        for &c in &choices {
            counts[c] += 1;
        }
        let max = counts.iter().copied().max().unwrap_or(0);
        let expected = counts.iter().position(|&c| c == max).unwrap_or(0);
        prop_assert_eq!(session.winning_proposal_id(), Ok(expected));
    }
}
