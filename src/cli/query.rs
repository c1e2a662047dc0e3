//! Read-only commands. None of these write the session file.

use super::context::Context;
use serde::Serialize;
use voting::identity::Principal;
use voting::voting::{Proposal, ProposalId, Voter};

#[derive(Serialize)]
struct VoterView<'a> {
    voter: &'a Principal,
    #[serde(flatten)]
    record: Voter,
}

#[derive(Serialize)]
struct ProposalView<'a> {
    id: ProposalId,
    #[serde(flatten)]
    proposal: &'a Proposal,
}

fn proposal_line(id: ProposalId, proposal: &Proposal) -> String {
    format!(
        "[{}] {} ({} vote{})",
        id,
        proposal.description,
        proposal.vote_count,
        if proposal.vote_count == 1 { "" } else { "s" }
    )
}

/// Show a voter record (registered voters only)
pub async fn voter(
    ctx: &Context,
    caller: Principal,
    voter: Principal,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let record = service.get_voter(&caller, &voter)?;

    let mut human = format!(
        "Voter: {}\nRegistered: {}\nHas voted: {}",
        voter, record.is_registered, record.has_voted
    );
    if record.has_voted {
        human.push_str(&format!("\nVoted for: {}", record.voted_proposal_id));
    }
    ctx.report(
        human,
        &VoterView {
            voter: &voter,
            record,
        },
    )
}

/// Show one proposal (registered voters only)
pub async fn proposal(
    ctx: &Context,
    caller: Principal,
    id: ProposalId,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let proposal = service.get_one_proposal(&caller, id)?;
    ctx.report(
        proposal_line(id, &proposal),
        &ProposalView {
            id,
            proposal: &proposal,
        },
    )
}

/// List every proposal in index order (registered voters only)
pub async fn proposals(ctx: &Context, caller: Principal) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let proposals = service.proposals(&caller)?;

    let human = if proposals.is_empty() {
        "No proposals yet".to_string()
    } else {
        proposals
            .iter()
            .enumerate()
            .map(|(id, p)| proposal_line(id, p))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let views: Vec<ProposalView<'_>> = proposals
        .iter()
        .enumerate()
        .map(|(id, proposal)| ProposalView { id, proposal })
        .collect();
    ctx.report(human, &views)
}

/// Show the winning proposal index (anyone)
pub async fn winner(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let id = service.winning_proposal_id()?;
    ctx.report(
        format!("Winning proposal: {}", id),
        &serde_json::json!({ "winning_proposal_id": id }),
    )
}
