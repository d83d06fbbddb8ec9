use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "shortBreak",
            SessionType::LongBreak => "longBreak",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionType::Work => "Focus",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Work)
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(SessionType::Work),
            "shortBreak" | "short_break" | "short-break" => Ok(SessionType::ShortBreak),
            "longBreak" | "long_break" | "long-break" => Ok(SessionType::LongBreak),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Completed,
    Skipped,
    Interrupted,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Skipped => "skipped",
            Outcome::Interrupted => "interrupted",
        }
    }

    /// Whether a Work session ending this way advances the cycle.
    pub fn counts_toward_cycle(&self) -> bool {
        matches!(self, Outcome::Completed | Outcome::Skipped)
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Outcome::Completed),
            "skipped" => Ok(Outcome::Skipped),
            "interrupted" => Ok(Outcome::Interrupted),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// A session that is currently counting down.
///
/// Only the engine holds one of these; it is turned into a
/// [`SessionRecord`] exactly once, when the session terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: Uuid,
    pub session_type: SessionType,
    /// Seconds requested at start.
    pub planned_duration: u64,
    pub start_time: DateTime<Utc>,
}

impl ActiveSession {
    pub(crate) fn begin(session_type: SessionType, planned_duration: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_type,
            planned_duration,
            start_time: now,
        }
    }

    /// Close the session with `remaining` seconds left on the clock.
    pub(crate) fn finalize(self, remaining: u64, outcome: Outcome, now: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: self.id,
            session_type: self.session_type,
            planned_duration: self.planned_duration,
            actual_duration: self.planned_duration.saturating_sub(remaining),
            start_time: self.start_time,
            end_time: now,
            outcome,
        }
    }
}

/// A terminated session as it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub planned_duration: u64,
    pub actual_duration: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub outcome: Outcome,
}

impl SessionRecord {
    pub fn is_work(&self) -> bool {
        self.session_type == SessionType::Work
    }
}

/// Format seconds as `MM:SS`. Minutes are not wrapped at 60.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_computes_elapsed() {
        let now = Utc::now();
        let active = ActiveSession::begin(SessionType::Work, 1500, now);
        let record = active.finalize(1490, Outcome::Interrupted, now);
        assert_eq!(record.actual_duration, 10);
        assert_eq!(record.planned_duration, 1500);
    }

    #[test]
    fn record_uses_original_field_names() {
        let now = Utc::now();
        let record = ActiveSession::begin(SessionType::ShortBreak, 300, now).finalize(
            0,
            Outcome::Completed,
            now,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "shortBreak");
        assert_eq!(json["actualDuration"], 300);
        assert_eq!(json["outcome"], "completed");
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(3661), "61:01");
    }

    #[test]
    fn session_type_parses_cli_spellings() {
        assert_eq!("work".parse::<SessionType>(), Ok(SessionType::Work));
        assert_eq!("long-break".parse::<SessionType>(), Ok(SessionType::LongBreak));
        assert!("nap".parse::<SessionType>().is_err());
    }
}
