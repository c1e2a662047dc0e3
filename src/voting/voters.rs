//! Voter registry.
//!
//! Owner-managed membership. Records are never removed and their flags only
//! ever move from false to true.

use super::proposals::ProposalId;
use super::traits::{VotingError, VotingResult};
use crate::identity::Principal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-principal voter record.
///
/// Unknown principals read as the zero-valued record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub is_registered: bool,
    pub has_voted: bool,
    /// Meaningful only when `has_voted` is true.
    pub voted_proposal_id: ProposalId,
}

/// Mapping from principal to voter record.
///
/// Kept sorted so the CBOR encoding, and thus the state fingerprint, is
/// independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistry {
    voters: BTreeMap<Principal, Voter>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `principal`, zero-valued if never referenced.
    pub fn get(&self, principal: &Principal) -> Voter {
        self.voters.get(principal).copied().unwrap_or_default()
    }

    pub fn is_registered(&self, principal: &Principal) -> bool {
        self.get(principal).is_registered
    }

    /// Registers `principal`. Fails if already registered.
    pub fn register(&mut self, principal: Principal) -> VotingResult<()> {
        if self.is_registered(&principal) {
            return Err(VotingError::AlreadyRegistered(principal));
        }
        self.voters.entry(principal).or_default().is_registered = true;
        Ok(())
    }

    /// Marks a registered voter as having voted for `proposal_id`.
    ///
    /// Callers must have checked registration and the proposal index.
    pub(crate) fn record_vote(
        &mut self,
        principal: &Principal,
        proposal_id: ProposalId,
    ) -> VotingResult<()> {
        let voter = self
            .voters
            .get_mut(principal)
            .filter(|v| v.is_registered)
            .ok_or(VotingError::NotAVoter)?;
        if voter.has_voted {
            return Err(VotingError::AlreadyVoted);
        }
        voter.has_voted = true;
        voter.voted_proposal_id = proposal_id;
        Ok(())
    }

    /// Number of registered voters.
    pub fn len(&self) -> usize {
        self.voters.values().filter(|v| v.is_registered).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registered voters who have voted.
    pub fn turnout(&self) -> usize {
        self.voters
            .values()
            .filter(|v| v.is_registered && v.has_voted)
            .count()
    }

    /// All stored records.
    pub fn iter(&self) -> impl Iterator<Item = (&Principal, &Voter)> {
        self.voters.iter()
    }
}
