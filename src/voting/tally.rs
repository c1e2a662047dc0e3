//! Tally resolver.
//!
//! Scans proposals in index order (GENESIS included) and keeps the first
//! index that reaches the maximum vote count. A later proposal with an equal
//! count never replaces the leader, so ties go to the lowest index.

use super::proposals::{Proposal, ProposalId};

/// Winning proposal index. An empty slice resolves to 0.
pub fn resolve_winner(proposals: &[Proposal]) -> ProposalId {
    let mut winner = 0;
    let mut best = 0;
    for (id, proposal) in proposals.iter().enumerate() {
        if proposal.vote_count > best {
            best = proposal.vote_count;
            winner = id;
        }
    }
    winner
}
