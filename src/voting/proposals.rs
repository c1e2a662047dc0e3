//! Proposal registry.
//!
//! Append-only, densely indexed from 0. Index 0 is always the GENESIS
//! proposal, appended when proposal registration opens.

use super::traits::{VotingError, VotingResult};
use serde::{Deserialize, Serialize};

/// Index into the proposal registry.
pub type ProposalId = usize;

/// Description of the automatically created proposal at index 0.
pub const GENESIS_DESCRIPTION: &str = "GENESIS";

/// A proposal and its running vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub description: String,
    pub vote_count: u64,
}

impl Proposal {
    fn new(description: String) -> Self {
        Self {
            description,
            vote_count: 0,
        }
    }
}

/// Ordered proposal list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the GENESIS proposal. Only valid on an empty registry.
    pub(crate) fn seed_genesis(&mut self) -> ProposalId {
        debug_assert!(self.proposals.is_empty(), "GENESIS must be proposal 0");
        self.push(GENESIS_DESCRIPTION.to_string())
    }

    /// Appends a participant proposal, returning its index.
    pub(crate) fn add(&mut self, description: String) -> VotingResult<ProposalId> {
        if description.is_empty() {
            return Err(VotingError::EmptyProposal);
        }
        Ok(self.push(description))
    }

    fn push(&mut self, description: String) -> ProposalId {
        self.proposals.push(Proposal::new(description));
        self.proposals.len() - 1
    }

    pub fn get(&self, id: ProposalId) -> VotingResult<&Proposal> {
        self.proposals
            .get(id)
            .ok_or(VotingError::ProposalNotFound(id))
    }

    pub fn contains(&self, id: ProposalId) -> bool {
        id < self.proposals.len()
    }

    /// Adds one vote to an existing proposal.
    pub(crate) fn increment(&mut self, id: ProposalId) -> VotingResult<()> {
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(VotingError::ProposalNotFound(id))?;
        proposal.vote_count += 1;
        Ok(())
    }

    pub fn as_slice(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}
