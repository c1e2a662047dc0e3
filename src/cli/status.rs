use super::context::Context;
use serde::Serialize;
use voting::identity::Principal;
use voting::persistence::FileStore;
use voting::voting::{ProposalId, VotingSession};

/// Public summary of a session, readable by anyone.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub config_path: String,
    pub state_path: String,
    pub owner: Principal,
    pub phase: String,
    pub phase_index: u8,
    pub voters: usize,
    pub votes_cast: usize,
    pub proposals: usize,
    pub winning_proposal_id: Option<ProposalId>,
    pub fingerprint: Option<String>,
}

impl StatusReport {
    pub fn new(ctx: &Context, session: &VotingSession, fingerprint: Option<String>) -> Self {
        Self {
            config_path: ctx.config_path.display().to_string(),
            state_path: ctx.state_path.display().to_string(),
            owner: session.owner().clone(),
            phase: session.workflow_status().description().to_string(),
            phase_index: session.workflow_status().index(),
            voters: session.voter_count(),
            votes_cast: session.votes_cast(),
            proposals: session.proposal_count(),
            winning_proposal_id: session.winning_proposal_id().ok(),
            fingerprint,
        }
    }

    fn render(&self) -> String {
        let mut out = format!(
            "Voting Session Status\n\n  Config: {}\n  State: {}\n  Owner: {}\n  Phase: {} ({})",
            self.config_path, self.state_path, self.owner, self.phase, self.phase_index
        );
        out.push_str(&format!(
            "\n  Voters: {}\n  Votes cast: {}\n  Proposals: {}",
            self.voters, self.votes_cast, self.proposals
        ));
        match self.winning_proposal_id {
            Some(id) => out.push_str(&format!("\n  Winner: {}", id)),
            None => out.push_str("\n  Winner: not tallied yet"),
        }
        if let Some(fp) = &self.fingerprint {
            out.push_str(&format!("\n  Fingerprint: {}", fp));
        }
        out
    }
}

/// Show session phase, owner, counts and state fingerprint
pub async fn execute(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let service = ctx.open_service().await?;
    let fingerprint = FileStore::new(ctx.state_path.clone())
        .read_envelope()
        .await?
        .map(|envelope| envelope.fingerprint);

    let report = StatusReport::new(ctx, &service.snapshot(), fingerprint);
    ctx.report(report.render(), &report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_reports_fresh_session() {
        let dir = TempDir::new().unwrap();
        let ctx = Context::resolve(Some(dir.path().join("config.toml")), None, false).unwrap();
        super::super::init::execute(&ctx, Principal::new("owner").unwrap(), false)
            .await
            .unwrap();

        let service = ctx.open_service().await.unwrap();
        let report = StatusReport::new(&ctx, &service.snapshot(), Some("ab".repeat(32)));
        // Release the session lock before running the command itself.
        drop(service);

        assert_eq!(report.phase_index, 0);
        assert_eq!(report.phase, "registering voters");
        assert_eq!(report.voters, 0);
        assert_eq!(report.votes_cast, 0);
        assert_eq!(report.winning_proposal_id, None);
        assert!(report.render().contains("not tallied yet"));

        execute(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_without_session_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = Context::resolve(Some(dir.path().join("config.toml")), None, false).unwrap();
        assert!(execute(&ctx).await.is_err());
    }
}
