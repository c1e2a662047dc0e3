use super::context::Context;
use voting::identity::Principal;
use voting::voting::{LogSink, SessionStore, VotingService};

/// Create a new voting session
///
/// Writes a fresh session in the voter registration phase. An existing
/// session file is only replaced with `--force`, since that discards every
/// registered voter, proposal and vote.
pub async fn execute(
    ctx: &Context,
    owner: Principal,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = ctx.store();
    let _lock = store.lock().await?;

    if store.exists() && !force {
        return Err(format!(
            "A voting session already exists at '{}'. Use --force to replace it.",
            ctx.state_path.display()
        )
        .into());
    }
    if store.exists() {
        tracing::warn!(path = %ctx.state_path.display(), "replacing existing session");
        // Surface a corrupt file in the log before it is overwritten.
        if let Err(e) = store.load().await {
            tracing::warn!(error = %e, "existing session was unreadable");
        }
    }

    let service = VotingService::create(store, owner, LogSink).await?;
    let snapshot = service.snapshot();

    ctx.report(
        format!(
            "Created voting session at {}\nOwner: {}\nPhase: {} ({})",
            ctx.state_path.display(),
            snapshot.owner(),
            snapshot.workflow_status(),
            snapshot.workflow_status().index()
        ),
        &*snapshot,
    )
}
