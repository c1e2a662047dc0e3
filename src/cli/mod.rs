use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use voting::identity::Principal;
use voting::voting::{PhaseTransition, ProposalId};

pub mod config;
pub mod context;
pub mod init;
pub mod logging;
pub mod mutate;
pub mod query;
pub mod status;
pub mod version;

#[derive(Parser)]
#[command(name = "voting")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for a single-round voting session", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/voting/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to session state file (overrides the config file)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Principal the command acts as.
#[derive(Args, Debug, Clone)]
pub struct Caller {
    /// Calling principal
    #[arg(long = "as", value_name = "PRINCIPAL")]
    pub principal: Principal,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new voting session owned by OWNER
    Init {
        /// Session owner
        #[arg(long)]
        owner: Principal,

        /// Replace an existing session file
        #[arg(long)]
        force: bool,
    },

    /// Register a voter (owner only)
    AddVoter {
        #[command(flatten)]
        caller: Caller,

        /// Principal to register
        voter: Principal,
    },

    /// Open proposal registration (owner only)
    StartProposals {
        #[command(flatten)]
        caller: Caller,
    },

    /// Submit a proposal (registered voters only)
    Propose {
        #[command(flatten)]
        caller: Caller,

        /// Proposal description
        description: String,
    },

    /// Close proposal registration (owner only)
    EndProposals {
        #[command(flatten)]
        caller: Caller,
    },

    /// Open voting (owner only)
    StartVoting {
        #[command(flatten)]
        caller: Caller,
    },

    /// Cast the caller's single vote (registered voters only)
    Vote {
        #[command(flatten)]
        caller: Caller,

        /// Proposal index
        proposal_id: ProposalId,
    },

    /// Close voting (owner only)
    EndVoting {
        #[command(flatten)]
        caller: Caller,
    },

    /// Count votes and record the winner (owner only)
    Tally {
        #[command(flatten)]
        caller: Caller,
    },

    /// Show a voter record (registered voters only)
    Voter {
        #[command(flatten)]
        caller: Caller,

        /// Principal to look up
        voter: Principal,
    },

    /// Show one proposal (registered voters only)
    Proposal {
        #[command(flatten)]
        caller: Caller,

        /// Proposal index
        proposal_id: ProposalId,
    },

    /// List all proposals (registered voters only)
    Proposals {
        #[command(flatten)]
        caller: Caller,
    },

    /// Show session phase, owner and counts
    Status,

    /// Show the winning proposal once votes are tallied
    Winner,

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        config,
        state,
        json,
        command,
    } = cli;

    // Printing the version must not create a config file.
    if let Commands::Version = command {
        version::execute();
        return Ok(());
    }

    let ctx = context::Context::resolve(config, state, json)?;
    run(&ctx, command).await
}

async fn run(ctx: &context::Context, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Init { owner, force } => init::execute(ctx, owner, force).await,
        Commands::AddVoter { caller, voter } => {
            mutate::add_voter(ctx, caller.principal, voter).await
        }
        Commands::StartProposals { caller } => {
            mutate::advance(ctx, caller.principal, PhaseTransition::StartProposalsRegistering)
                .await
        }
        Commands::Propose {
            caller,
            description,
        } => mutate::propose(ctx, caller.principal, description).await,
        Commands::EndProposals { caller } => {
            mutate::advance(ctx, caller.principal, PhaseTransition::EndProposalsRegistering).await
        }
        Commands::StartVoting { caller } => {
            mutate::advance(ctx, caller.principal, PhaseTransition::StartVotingSession).await
        }
        Commands::Vote {
            caller,
            proposal_id,
        } => mutate::vote(ctx, caller.principal, proposal_id).await,
        Commands::EndVoting { caller } => {
            mutate::advance(ctx, caller.principal, PhaseTransition::EndVotingSession).await
        }
        Commands::Tally { caller } => {
            mutate::advance(ctx, caller.principal, PhaseTransition::TallyVotes).await
        }
        Commands::Voter { caller, voter } => query::voter(ctx, caller.principal, voter).await,
        Commands::Proposal {
            caller,
            proposal_id,
        } => query::proposal(ctx, caller.principal, proposal_id).await,
        Commands::Proposals { caller } => query::proposals(ctx, caller.principal).await,
        Commands::Status => status::execute(ctx).await,
        Commands::Winner => query::winner(ctx).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
