//! Today / week / all-time focus statistics.
//!
//! Every figure is computed from the stored record log relative to a
//! caller-supplied "now". Calendar days are taken in `now`'s time zone, so
//! pass a `DateTime<Local>` to get the user's days.
//!
//! Counting rules:
//! - only Work records are considered
//! - `completed_count` counts `Completed` outcomes
//! - `total_actual_seconds` sums `actual_duration` over every outcome

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::storage::SessionStore;
use crate::timer::{Outcome, SessionRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStats {
    pub completed_count: u64,
    pub interrupted_count: u64,
    pub total_actual_seconds: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekStats {
    pub completed_count: u64,
    pub total_actual_seconds: u64,
    /// Completed sessions per day over seven days, one decimal.
    pub daily_average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllTimeStats {
    pub completed_count: u64,
    pub total_actual_seconds: u64,
    pub distinct_active_days: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub today: TodayStats,
    pub week: WeekStats,
    pub all_time: AllTimeStats,
}

/// Read-only view over a session log.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    records: Vec<SessionRecord>,
}

impl StatsAggregator {
    pub fn new(records: Vec<SessionRecord>) -> Self {
        Self { records }
    }

    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn load<S: SessionStore + ?Sized>(store: &S) -> Result<Self, PersistenceError> {
        Ok(Self::new(store.load_sessions()?))
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    fn work_on<'a, Tz: TimeZone>(
        &'a self,
        tz: &'a Tz,
        keep: impl Fn(NaiveDate) -> bool + 'a,
    ) -> impl Iterator<Item = &'a SessionRecord> + 'a {
        self.records
            .iter()
            .filter(|r| r.is_work())
            .filter(move |r| keep(local_day(r, tz)))
    }

    pub fn today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TodayStats {
        let tz = now.timezone();
        let today = now.date_naive();
        let mut stats = TodayStats::default();
        for record in self.work_on(&tz, |day| day == today) {
            match record.outcome {
                Outcome::Completed => stats.completed_count += 1,
                Outcome::Interrupted => stats.interrupted_count += 1,
                Outcome::Skipped => {}
            }
            stats.total_actual_seconds += record.actual_duration;
        }
        stats
    }

    /// The calendar week containing `now`, starting on Sunday.
    pub fn week<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> WeekStats {
        let tz = now.timezone();
        let start = week_start(now.date_naive());
        let end = start + Duration::days(7);
        let mut stats = WeekStats::default();
        for record in self.work_on(&tz, |day| day >= start && day < end) {
            if record.outcome == Outcome::Completed {
                stats.completed_count += 1;
            }
            stats.total_actual_seconds += record.actual_duration;
        }
        stats.daily_average = (stats.completed_count as f64 / 7.0 * 10.0).round() / 10.0;
        stats
    }

    /// Totals over the whole log. `tz` decides where days begin.
    pub fn all_time<Tz: TimeZone>(&self, tz: &Tz) -> AllTimeStats {
        let mut stats = AllTimeStats::default();
        let mut days = HashSet::new();
        for record in self.work_on(tz, |_| true) {
            if record.outcome == Outcome::Completed {
                stats.completed_count += 1;
            }
            stats.total_actual_seconds += record.actual_duration;
            days.insert(local_day(record, tz));
        }
        stats.distinct_active_days = days.len() as u64;
        stats
    }

    pub fn report<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> StatsReport {
        StatsReport {
            today: self.today(now),
            week: self.week(now),
            all_time: self.all_time(&now.timezone()),
        }
    }
}

fn local_day<Tz: TimeZone>(record: &SessionRecord, tz: &Tz) -> NaiveDate {
    record.start_time.with_timezone(tz).date_naive()
}

/// The Sunday on or before `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}
