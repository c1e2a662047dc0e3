//! Single-round voting workflow.
//!
//! An owner registers voters, opens and closes proposal collection, opens
//! and closes voting, then tallies. Registered voters submit proposals and
//! cast one vote each.
//!
//! Layering, leaves first:
//! - `workflow`: phase state machine, the only place phases are compared
//! - `voters` / `proposals`: the two registries
//! - `ballot`: one-vote-per-voter engine
//! - `tally`: winner resolution
//! - `session`: the state object tying them together with access control
//! - `service`: single-writer, snapshot-reader wrapper for concurrent callers

pub mod ballot;
pub mod events;
pub mod mock;
pub mod proposals;
pub mod service;
pub mod session;
pub mod stream;
pub mod tally;
pub mod traits;
pub mod voters;
pub mod workflow;

#[cfg(test)]
mod proptests;

pub use events::VotingEvent;
pub use mock::{MemoryStore, RecordingSink};
pub use proposals::{Proposal, ProposalId, GENESIS_DESCRIPTION};
pub use service::{LogSink, VotingService};
pub use session::VotingSession;
pub use stream::{EventStream, EventStreamSender};
pub use traits::{EventSink, SessionStore, StoreError, StoreResult, VotingError, VotingResult};
pub use voters::Voter;
pub use workflow::{Operation, PhaseTransition, WorkflowStatus};
