mod config;
pub mod database;
mod memory;
pub mod migrations;

pub use config::{Config, LoggingConfig, StorageConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, PersistenceError};
use crate::timer::{SessionRecord, Settings};

/// Durable log of terminated sessions plus the settings record.
pub trait SessionStore {
    /// Append one finalized session. Called exactly once per session.
    fn append_session(&mut self, record: &SessionRecord) -> Result<(), PersistenceError>;

    /// All stored sessions, oldest first.
    fn load_sessions(&self) -> Result<Vec<SessionRecord>, PersistenceError>;

    /// The saved settings, or `None` if nothing was ever saved.
    fn load_settings(&self) -> Result<Option<Settings>, PersistenceError>;

    /// Overwrite the settings record as-is. Use [`save_settings`] unless the
    /// record is known to be valid.
    ///
    /// [`save_settings`]: SessionStore::save_settings
    fn write_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError>;

    /// Validate and overwrite the settings record. An invalid record is
    /// rejected and the stored one is left in place.
    ///
    /// # Errors
    /// `Config` if the settings break an invariant, `Persistence` if the
    /// write fails.
    fn save_settings(&mut self, settings: &Settings) -> Result<(), CoreError> {
        settings.validate()?;
        self.write_settings(settings)?;
        Ok(())
    }

    /// Remove every stored session. Settings are kept.
    fn clear_sessions(&mut self) -> Result<(), PersistenceError>;
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn append_session(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
        (**self).append_session(record)
    }
    fn load_sessions(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        (**self).load_sessions()
    }
    fn load_settings(&self) -> Result<Option<Settings>, PersistenceError> {
        (**self).load_settings()
    }
    fn write_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError> {
        (**self).write_settings(settings)
    }
    fn clear_sessions(&mut self) -> Result<(), PersistenceError> {
        (**self).clear_sessions()
    }
}

/// Load settings, falling back to defaults when none are stored or the
/// stored record breaks an invariant.
///
/// # Errors
/// Returns an error only if the store itself fails.
pub fn load_settings_or_default<S: SessionStore + ?Sized>(
    store: &S,
) -> Result<Settings, PersistenceError> {
    match store.load_settings()? {
        Some(settings) => match settings.validate() {
            Ok(()) => Ok(settings),
            Err(e) => {
                tracing::warn!(error = %e, "stored settings are invalid, using defaults");
                Ok(Settings::default())
            }
        },
        None => Ok(Settings::default()),
    }
}

/// Everything the store holds, in one JSON-friendly document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub settings: Settings,
    pub sessions: Vec<SessionRecord>,
    pub export_date: DateTime<Utc>,
}

impl ExportBundle {
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn collect<S: SessionStore + ?Sized>(
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            settings: load_settings_or_default(store)?,
            sessions: store.load_sessions()?,
            export_date: now,
        })
    }

    /// File name for an export taken on `export_date`.
    pub fn file_name(&self) -> String {
        format!("focustimer-stats-{}.json", self.export_date.format("%Y-%m-%d"))
    }
}

/// Returns the data directory.
///
/// `FOCUSTIMER_DATA_DIR` wins if set. Otherwise `~/.config/focustimer[-dev]/`
/// based on `FOCUSTIMER_ENV` (set it to `dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FOCUSTIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focustimer-dev")
            } else {
                base_dir.join("focustimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
