use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{SessionRecord, SessionType, TimerState};

/// Every state change in the scheduler produces an Event.
/// Front ends render them; nothing in the core depends on who listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        session_type: SessionType,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A session was finalized and appended to the store.
    SessionEnded {
        record: SessionRecord,
        cycle_count: u32,
        next_type: SessionType,
        next_duration_secs: u64,
        auto_start: bool,
        at: DateTime<Utc>,
    },
    /// A record held back by a failed append reached the store.
    PendingSaved {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    PendingDiscarded {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    /// Reset while idle: the countdown is re-armed for Work.
    TimerReset {
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        at: DateTime<Utc>,
    },
    HistoryCleared {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        session_type: SessionType,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        cycle_count: u32,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_kind() {
        let ev = Event::SessionPaused {
            remaining_secs: 42,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "session_paused");
        assert_eq!(json["remaining_secs"], 42);
    }
}
