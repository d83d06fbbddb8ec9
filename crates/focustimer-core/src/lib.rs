//! # focustimer Core Library
//!
//! Business logic for the focustimer focus-session timer. The CLI binary is
//! a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine over Work / Short Break /
//!   Long Break sessions; the caller delivers elapsed seconds via `tick()`
//! - **Storage**: SQLite session log and settings, TOML application config
//! - **Statistics**: today / week / all-time figures over the session log
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core scheduler state machine
//! - [`SessionStore`]: Session log and settings persistence
//! - [`StatsAggregator`]: Focus statistics
//! - [`Notifier`]: Sink for start/end notifications

pub mod error;
pub mod events;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, PersistenceError, TransitionError};
pub use events::Event;
pub use notify::{LogNotifier, Notifier, NullNotifier};
pub use stats::{AllTimeStats, StatsAggregator, StatsReport, TodayStats, WeekStats};
pub use storage::{Config, Database, ExportBundle, MemoryStore, SessionStore};
pub use timer::{
    Clock, ManualClock, Outcome, SessionRecord, SessionType, Settings, SystemClock, Ticker,
    TimerEngine, TimerState,
};
