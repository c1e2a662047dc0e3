//! Voting session state.
//!
//! `VotingSession` is the single state object for one voting round: the
//! owner, the phase, both registries and the tally result. Every operation
//! takes the caller explicitly, runs its access check, then its phase check,
//! and only then mutates. A rejected call leaves the session untouched.
//!
//! Access classes:
//! - owner-only: `add_voter` and the five phase triggers
//! - registered-voter-only: `get_voter`, `add_proposal`, `get_one_proposal`,
//!   `proposals`, `set_vote`
//! - unrestricted: `owner`, `workflow_status`, `winning_proposal_id`,
//!   `proposal_count`, `voter_count`

use super::ballot::cast_vote;
use super::events::VotingEvent;
use super::proposals::{Proposal, ProposalId, ProposalRegistry, GENESIS_DESCRIPTION};
use super::tally::resolve_winner;
use super::traits::{VotingError, VotingResult};
use super::voters::{Voter, VoterRegistry};
use super::workflow::{Operation, PhaseTransition, WorkflowStatus};
use crate::identity::Principal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State of one voting round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSession {
    owner: Principal,
    status: WorkflowStatus,
    voters: VoterRegistry,
    proposals: ProposalRegistry,
    winning_proposal_id: Option<ProposalId>,
}

impl VotingSession {
    /// New session in the voter registration phase, owned by `owner`.
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            status: WorkflowStatus::RegisteringVoters,
            voters: VoterRegistry::new(),
            proposals: ProposalRegistry::new(),
            winning_proposal_id: None,
        }
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn workflow_status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Registered voters who have cast their vote.
    pub fn votes_cast(&self) -> usize {
        self.voters.turnout()
    }

    /// Winning proposal index, available once votes are tallied.
    pub fn winning_proposal_id(&self) -> VotingResult<ProposalId> {
        self.winning_proposal_id.ok_or(VotingError::NotTalliedYet)
    }

    fn ensure_owner(&self, caller: &Principal) -> VotingResult<()> {
        if caller == &self.owner {
            Ok(())
        } else {
            Err(VotingError::NotOwner)
        }
    }

    fn ensure_voter(&self, caller: &Principal) -> VotingResult<()> {
        if self.voters.is_registered(caller) {
            Ok(())
        } else {
            Err(VotingError::NotAVoter)
        }
    }

    // ---- Voter registry ----

    /// Registers `voter`. Owner-only, registration phase only.
    pub fn add_voter(&mut self, caller: &Principal, voter: Principal) -> VotingResult<VotingEvent> {
        self.ensure_owner(caller)?;
        self.status.check(Operation::AddVoter)?;
        self.voters.register(voter.clone())?;
        Ok(VotingEvent::VoterRegistered { voter })
    }

    /// Any principal's record, zero-valued if unknown. Registered voters only.
    pub fn get_voter(&self, caller: &Principal, voter: &Principal) -> VotingResult<Voter> {
        self.ensure_voter(caller)?;
        Ok(self.voters.get(voter))
    }

    // ---- Proposal registry ----

    /// Appends a proposal. Registered voters only, while proposals are open.
    pub fn add_proposal(
        &mut self,
        caller: &Principal,
        description: impl Into<String>,
    ) -> VotingResult<VotingEvent> {
        self.ensure_voter(caller)?;
        self.status.check(Operation::AddProposal)?;
        let proposal_id = self.proposals.add(description.into())?;
        Ok(VotingEvent::ProposalRegistered { proposal_id })
    }

    pub fn get_one_proposal(&self, caller: &Principal, id: ProposalId) -> VotingResult<&Proposal> {
        self.ensure_voter(caller)?;
        self.proposals.get(id)
    }

    /// Every proposal in index order.
    pub fn proposals(&self, caller: &Principal) -> VotingResult<&[Proposal]> {
        self.ensure_voter(caller)?;
        Ok(self.proposals.as_slice())
    }

    // ---- Voting engine ----

    pub fn set_vote(&mut self, caller: &Principal, id: ProposalId) -> VotingResult<VotingEvent> {
        cast_vote(
            self.status,
            &mut self.voters,
            &mut self.proposals,
            caller,
            id,
        )
    }

    // ---- Workflow ----

    /// Opens proposal registration and appends GENESIS at index 0.
    pub fn start_proposals_registering(&mut self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::StartProposalsRegistering)
    }

    pub fn end_proposals_registering(&mut self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::EndProposalsRegistering)
    }

    pub fn start_voting_session(&mut self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::StartVotingSession)
    }

    pub fn end_voting_session(&mut self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::EndVotingSession)
    }

    /// Computes and stores the winner, closing the session.
    pub fn tally_votes(&mut self, caller: &Principal) -> VotingResult<VotingEvent> {
        self.advance(caller, PhaseTransition::TallyVotes)
    }

    /// Applies an owner-triggered transition and its entry effect.
    pub fn advance(
        &mut self,
        caller: &Principal,
        transition: PhaseTransition,
    ) -> VotingResult<VotingEvent> {
        self.ensure_owner(caller)?;
        let next = self.status.transition(transition)?;

        match transition {
            PhaseTransition::StartProposalsRegistering => {
                self.proposals.seed_genesis();
            }
            PhaseTransition::TallyVotes => {
                self.winning_proposal_id = Some(resolve_winner(self.proposals.as_slice()));
            }
            PhaseTransition::EndProposalsRegistering
            | PhaseTransition::StartVotingSession
            | PhaseTransition::EndVotingSession => {}
        }

        let previous = self.status;
        self.status = next;
        Ok(VotingEvent::WorkflowStatusChange {
            previous,
            current: next,
        })
    }

    /// Checks every state invariant. Used on sessions read back from storage.
    pub fn validate(&self) -> Result<(), String> {
        let proposals = self.proposals.as_slice();
        let started = self.status >= WorkflowStatus::ProposalsRegistrationStarted;

        match proposals.first() {
            None if started => return Err("missing GENESIS proposal".to_string()),
            Some(_) if !started => {
                return Err("proposals exist before registration opened".to_string())
            }
            Some(genesis) if genesis.description != GENESIS_DESCRIPTION => {
                return Err(format!(
                    "proposal 0 is '{}', expected {}",
                    genesis.description, GENESIS_DESCRIPTION
                ))
            }
            _ => {}
        }
        if let Some(id) = proposals
            .iter()
            .skip(1)
            .position(|p| p.description.is_empty())
        {
            return Err(format!("proposal {} has an empty description", id + 1));
        }

        let mut counted: HashMap<ProposalId, u64> = HashMap::new();
        for (principal, voter) in self.voters.iter() {
            if !voter.has_voted {
                continue;
            }
            if !voter.is_registered {
                return Err(format!("unregistered principal {} has voted", principal));
            }
            if self.status < WorkflowStatus::VotingSessionStarted {
                return Err(format!("{} voted before the voting session", principal));
            }
            if voter.voted_proposal_id >= proposals.len() {
                return Err(format!(
                    "{} voted for unknown proposal {}",
                    principal, voter.voted_proposal_id
                ));
            }
            *counted.entry(voter.voted_proposal_id).or_default() += 1;
        }
        for (id, proposal) in proposals.iter().enumerate() {
            let expected = counted.get(&id).copied().unwrap_or(0);
            if proposal.vote_count != expected {
                return Err(format!(
                    "proposal {} has {} votes, {} voters chose it",
                    id, proposal.vote_count, expected
                ));
            }
        }

        match (self.status.is_terminal(), self.winning_proposal_id) {
            (true, Some(winner)) if winner == resolve_winner(proposals) => Ok(()),
            (true, Some(winner)) => Err(format!("stored winner {} does not match tally", winner)),
            (true, None) => Err("tallied session has no winner".to_string()),
            (false, Some(_)) => Err("winner stored before tally".to_string()),
            (false, None) => Ok(()),
        }
    }
}
