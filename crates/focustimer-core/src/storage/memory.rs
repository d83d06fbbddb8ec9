//! In-memory session store for tests and embedding.

use super::SessionStore;
use crate::error::PersistenceError;
use crate::timer::{SessionRecord, Settings};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Vec<SessionRecord>,
    settings: Option<Settings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<SessionRecord>) -> Self {
        Self {
            sessions,
            settings: None,
        }
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }
}

impl SessionStore for MemoryStore {
    fn append_session(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
        self.sessions.push(record.clone());
        Ok(())
    }

    fn load_sessions(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        Ok(self.sessions.clone())
    }

    fn load_settings(&self) -> Result<Option<Settings>, PersistenceError> {
        Ok(self.settings.clone())
    }

    fn write_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError> {
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn clear_sessions(&mut self) -> Result<(), PersistenceError> {
        self.sessions.clear();
        Ok(())
    }
}
