//! Statistics module for focustimer
//!
//! Aggregates the stored session log into daily, weekly and all-time
//! focus figures.

mod aggregator;

pub use aggregator::{
    week_start, AllTimeStats, StatsAggregator, StatsReport, TodayStats, WeekStats,
};
