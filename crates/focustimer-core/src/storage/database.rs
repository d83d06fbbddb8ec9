//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Terminated focus and break sessions
//! - Timer settings (JSON in the key-value table)
//! - Key-value store for application state

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{data_dir, migrations, SessionStore};
use crate::error::PersistenceError;
use crate::timer::{SessionRecord, Settings};

const SETTINGS_KEY: &str = "settings";

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Default location: `<data_dir>/focustimer.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn default_path() -> Result<PathBuf, std::io::Error> {
        Ok(data_dir()?.join("focustimer.db"))
    }

    /// Open the database at the default location.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, PersistenceError> {
        let path = Self::default_path().map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        Self::open_at(&path)
    }

    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|source| PersistenceError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "session database opened");
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory().map_err(|source| PersistenceError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), PersistenceError> {
        migrations::migrate(&self.conn)
            .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> Result<u64, rusqlite::Error> {
        self.conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, u64>(0))
    }
}

struct RawRow {
    id: String,
    session_type: String,
    planned_duration: u64,
    actual_duration: u64,
    start_time: String,
    end_time: String,
    outcome: String,
}

impl RawRow {
    fn decode(self) -> Result<SessionRecord, PersistenceError> {
        let corrupt = |what: &str, value: &str| {
            PersistenceError::Corrupt(format!("session {}: bad {what} '{value}'", self.id))
        };
        Ok(SessionRecord {
            id: self.id.parse().map_err(|_| corrupt("id", &self.id))?,
            session_type: self
                .session_type
                .parse()
                .map_err(|_| corrupt("type", &self.session_type))?,
            planned_duration: self.planned_duration,
            actual_duration: self.actual_duration,
            start_time: parse_time(&self.start_time).ok_or_else(|| corrupt("start_time", &self.start_time))?,
            end_time: parse_time(&self.end_time).ok_or_else(|| corrupt("end_time", &self.end_time))?,
            outcome: self.outcome.parse().map_err(|_| corrupt("outcome", &self.outcome))?,
        })
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl SessionStore for Database {
    fn append_session(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT INTO sessions
                (id, session_type, planned_duration, actual_duration, start_time, end_time, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                record.session_type.as_str(),
                record.planned_duration,
                record.actual_duration,
                record.start_time.to_rfc3339(),
                record.end_time.to_rfc3339(),
                record.outcome.as_str(),
            ],
        )?;
        Ok(())
    }

    fn load_sessions(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_type, planned_duration, actual_duration, start_time, end_time, outcome
             FROM sessions
             ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawRow {
                id: row.get(0)?,
                session_type: row.get(1)?,
                planned_duration: row.get(2)?,
                actual_duration: row.get(3)?,
                start_time: row.get(4)?,
                end_time: row.get(5)?,
                outcome: row.get(6)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.decode()?);
        }
        Ok(sessions)
    }

    fn load_settings(&self) -> Result<Option<Settings>, PersistenceError> {
        match self.kv_get(SETTINGS_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| PersistenceError::Corrupt(format!("settings: {e}"))),
            None => Ok(None),
        }
    }

    fn write_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| PersistenceError::Corrupt(format!("settings: {e}")))?;
        self.kv_set(SETTINGS_KEY, &json)?;
        Ok(())
    }

    fn clear_sessions(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, CoreError};
    use crate::timer::{Outcome, SessionType};
    use uuid::Uuid;

    fn record(session_type: SessionType, outcome: Outcome, actual: u64) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: Uuid::new_v4(),
            session_type,
            planned_duration: 1500,
            actual_duration: actual,
            start_time: now,
            end_time: now,
            outcome,
        }
    }

    #[test]
    fn append_and_load_in_order() {
        let mut db = Database::open_memory().unwrap();
        let first = record(SessionType::Work, Outcome::Completed, 1500);
        let second = record(SessionType::ShortBreak, Outcome::Skipped, 12);
        db.append_session(&first).unwrap();
        db.append_session(&second).unwrap();

        let loaded = db.load_sessions().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, first.id);
        assert_eq!(loaded[1].session_type, SessionType::ShortBreak);
        assert_eq!(loaded[1].outcome, Outcome::Skipped);
        assert_eq!(loaded[1].actual_duration, 12);
    }

    #[test]
    fn duplicate_append_is_rejected() {
        let mut db = Database::open_memory().unwrap();
        let r = record(SessionType::Work, Outcome::Completed, 1500);
        db.append_session(&r).unwrap();
        assert!(db.append_session(&r).is_err());
        assert_eq!(db.session_count().unwrap(), 1);
    }

    #[test]
    fn settings_roundtrip() {
        let mut db = Database::open_memory().unwrap();
        assert!(db.load_settings().unwrap().is_none());
        let settings = Settings {
            work_duration: 3000,
            auto_start_breaks: true,
            ..Settings::default()
        };
        db.save_settings(&settings).unwrap();
        assert_eq!(db.load_settings().unwrap(), Some(settings));
    }

    #[test]
    fn invalid_settings_are_not_written() {
        let mut db = Database::open_memory().unwrap();
        let previous = Settings {
            work_duration: 3000,
            ..Settings::default()
        };
        db.save_settings(&previous).unwrap();

        let broken = Settings {
            work_duration: 0,
            ..Settings::default()
        };
        let err = db.save_settings(&broken).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(db.load_settings().unwrap(), Some(previous));
    }

    #[test]
    fn clear_keeps_settings() {
        let mut db = Database::open_memory().unwrap();
        db.save_settings(&Settings::default()).unwrap();
        db.append_session(&record(SessionType::Work, Outcome::Interrupted, 10))
            .unwrap();
        db.clear_sessions().unwrap();
        assert!(db.load_sessions().unwrap().is_empty());
        assert!(db.load_settings().unwrap().is_some());
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn corrupt_row_is_reported() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO sessions
                    (id, session_type, planned_duration, actual_duration, start_time, end_time, outcome)
                 VALUES ('not-a-uuid', 'work', 1, 1, 'x', 'x', 'completed')",
                [],
            )
            .unwrap();
        assert!(matches!(db.load_sessions(), Err(PersistenceError::Corrupt(_))));
    }
}
