//! In-memory test doubles for the voting collaborators.

use super::events::VotingEvent;
use super::session::VotingSession;
use super::traits::{EventSink, SessionStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Event sink that records every notification for assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<VotingEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events in emission order.
    pub fn events(&self) -> Vec<VotingEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Most recent event, if any.
    pub fn last(&self) -> Option<VotingEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &VotingEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Default)]
struct MemoryState {
    session: Option<VotingSession>,
    saves: usize,
    fail_saves: bool,
}

/// Session store kept in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `session`.
    pub fn with_session(session: VotingSession) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().session = Some(session);
        store
    }

    /// Make subsequent saves fail (for testing rejection paths).
    pub fn set_fail_saves(&self, fail: bool) {
        self.state.lock().unwrap().fail_saves = fail;
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().saves
    }

    /// Currently stored session.
    pub fn stored(&self) -> Option<VotingSession> {
        self.state.lock().unwrap().session.clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> StoreResult<Option<VotingSession>> {
        Ok(self.stored())
    }

    async fn save(&self, session: &VotingSession) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_saves {
            return Err(StoreError::Io("simulated write failure".to_string()));
        }
        state.session = Some(session.clone());
        state.saves += 1;
        Ok(())
    }
}
