//! Mutating commands.
//!
//! Each command opens the session, runs one call through the service
//! (which persists before committing) and prints the emitted event.

use super::context::Context;
use voting::identity::Principal;
use voting::voting::{PhaseTransition, ProposalId, VotingEvent};

fn print_event(ctx: &Context, event: &VotingEvent) -> Result<(), Box<dyn std::error::Error>> {
    ctx.report(event, event)
}

/// Register `voter` (owner only)
pub async fn add_voter(
    ctx: &Context,
    caller: Principal,
    voter: Principal,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let event = service.add_voter(&caller, voter).await?;
    print_event(ctx, &event)
}

/// Submit a proposal (registered voters only)
pub async fn propose(
    ctx: &Context,
    caller: Principal,
    description: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let event = service.add_proposal(&caller, description).await?;
    print_event(ctx, &event)
}

/// Cast a vote (registered voters only)
pub async fn vote(
    ctx: &Context,
    caller: Principal,
    proposal_id: ProposalId,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let event = service.set_vote(&caller, proposal_id).await?;
    print_event(ctx, &event)
}

/// Run one owner-triggered phase transition
pub async fn advance(
    ctx: &Context,
    caller: Principal,
    transition: PhaseTransition,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let event = service.advance(&caller, transition).await?;
    print_event(ctx, &event)?;

    if transition == PhaseTransition::TallyVotes && !ctx.json {
        println!("Winning proposal: {}", service.winning_proposal_id()?);
    }
    Ok(())
}
