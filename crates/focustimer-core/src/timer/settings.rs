//! Timer settings.
//!
//! Durations are stored in seconds. Missing fields fall back to their
//! defaults when a partially written record is loaded. Field names are
//! camelCase on the wire; snake_case names are accepted when reading and by
//! [`Settings::get`] / [`Settings::with_value`].

use serde::{Deserialize, Serialize};

use super::session::SessionType;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work_duration", alias = "work_duration")]
    pub work_duration: u64,
    #[serde(default = "default_short_break_duration", alias = "short_break_duration")]
    pub short_break_duration: u64,
    #[serde(default = "default_long_break_duration", alias = "long_break_duration")]
    pub long_break_duration: u64,
    #[serde(
        default = "default_sessions_until_long_break",
        alias = "sessions_until_long_break"
    )]
    pub sessions_until_long_break: u32,
    #[serde(default, alias = "auto_start_breaks")]
    pub auto_start_breaks: bool,
    #[serde(default, alias = "auto_start_work")]
    pub auto_start_work: bool,
    #[serde(default = "default_true", alias = "notifications_enabled")]
    pub notifications_enabled: bool,
    #[serde(default = "default_true", alias = "sound_enabled")]
    pub sound_enabled: bool,
}

/// `work_duration` -> `workDuration`. Already camelCase keys pass through.
fn wire_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' || c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn default_work_duration() -> u64 {
    25 * 60
}
fn default_short_break_duration() -> u64 {
    5 * 60
}
fn default_long_break_duration() -> u64 {
    15 * 60
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break_duration(),
            long_break_duration: default_long_break_duration(),
            sessions_until_long_break: default_sessions_until_long_break(),
            auto_start_breaks: false,
            auto_start_work: false,
            notifications_enabled: true,
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Configured duration in seconds for a session type.
    pub fn duration_for(&self, session_type: SessionType) -> u64 {
        match session_type {
            SessionType::Work => self.work_duration,
            SessionType::ShortBreak => self.short_break_duration,
            SessionType::LongBreak => self.long_break_duration,
        }
    }

    /// Whether a session of this type starts on its own once the previous
    /// one ends.
    pub fn auto_starts(&self, session_type: SessionType) -> bool {
        if session_type.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_work
        }
    }

    /// Check the invariants: every duration is positive and the cycle
    /// length is at least one.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("workDuration", self.work_duration),
            ("shortBreakDuration", self.short_break_duration),
            ("longBreakDuration", self.long_break_duration),
        ];
        for (key, value) in durations {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "duration must be greater than zero".into(),
                });
            }
        }
        if self.sessions_until_long_break == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sessionsUntilLongBreak".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Get a field as a string by name.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        json.get(wire_key(key)).map(|v| v.to_string())
    }

    /// Return a copy with one field replaced. The copy is validated; `self`
    /// is left untouched.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value does not parse as
    /// the field's type, or the result violates an invariant.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self, ConfigError> {
        let mut json = serde_json::to_value(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::ParseFailed("settings is not an object".into()))?;
        let field = wire_key(key);
        let existing = obj
            .get(&field)
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.into(),
            message,
        };
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            _ => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?
                    .into(),
            ),
        };
        obj.insert(field, new_value);

        let updated: Settings =
            serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_classic_pomodoro() {
        let s = Settings::default();
        assert_eq!(s.work_duration, 1500);
        assert_eq!(s.short_break_duration, 300);
        assert_eq!(s.long_break_duration, 900);
        assert_eq!(s.sessions_until_long_break, 4);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let s = Settings {
            short_break_duration: 0,
            ..Settings::default()
        };
        match s.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "shortBreakDuration"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn zero_cycle_length_is_rejected() {
        let s = Settings {
            sessions_until_long_break: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn partial_record_merges_with_defaults() {
        let s: Settings = serde_json::from_str(r#"{"work_duration": 600}"#).unwrap();
        assert_eq!(s.work_duration, 600);
        assert_eq!(s.long_break_duration, 900);
        assert!(s.notifications_enabled);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["workDuration"], 1500);
        assert_eq!(json["sessionsUntilLongBreak"], 4);
        assert!(json.get("work_duration").is_none());

        let s: Settings = serde_json::from_str(r#"{"shortBreakDuration": 120}"#).unwrap();
        assert_eq!(s.short_break_duration, 120);
    }

    #[test]
    fn keys_accept_either_casing() {
        let s = Settings::default();
        assert_eq!(s.get("longBreakDuration").as_deref(), Some("900"));
        let updated = s.with_value("autoStartBreaks", "true").unwrap();
        assert!(updated.auto_start_breaks);
        let updated = s.with_value("sessions_until_long_break", "3").unwrap();
        assert_eq!(updated.sessions_until_long_break, 3);
    }

    #[test]
    fn auto_start_flag_follows_type() {
        let s = Settings {
            auto_start_breaks: true,
            ..Settings::default()
        };
        assert!(s.auto_starts(SessionType::ShortBreak));
        assert!(s.auto_starts(SessionType::LongBreak));
        assert!(!s.auto_starts(SessionType::Work));
    }

    #[test]
    fn with_value_updates_and_validates() {
        let s = Settings::default();
        let updated = s.with_value("work_duration", "1200").unwrap();
        assert_eq!(updated.work_duration, 1200);

        let updated = s.with_value("auto_start_work", "true").unwrap();
        assert!(updated.auto_start_work);

        assert!(matches!(
            s.with_value("work_duration", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            s.with_value("volume", "3"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(s.with_value("sound_enabled", "loud").is_err());
    }

    #[test]
    fn get_returns_field_text() {
        let s = Settings::default();
        assert_eq!(s.get("work_duration").as_deref(), Some("1500"));
        assert_eq!(s.get("sound_enabled").as_deref(), Some("true"));
        assert!(s.get("missing").is_none());
    }
}
