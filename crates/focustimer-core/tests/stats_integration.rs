//! Integration tests for statistics over the SQLite session store.
//!
//! Records sessions through the engine into an on-disk database, reopens
//! it, and checks the aggregated figures.

use chrono::{DateTime, Duration, Utc};
use focustimer_core::{
    Database, ExportBundle, ManualClock, NullNotifier, Outcome, SessionType,
    Settings, StatsAggregator, TimerEngine,
};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn today_scenario_through_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");

    {
        let clock = ManualClock::new(at("2024-05-14T10:00:00Z"));
        let db = Database::open_at(&path).unwrap();
        let mut engine = TimerEngine::with_clock(db, NullNotifier, clock.clone()).unwrap();

        // yesterday
        engine.start(Some(SessionType::Work)).unwrap();
        clock.advance(Duration::seconds(1500));
        engine.tick(1500).unwrap();

        // today: completed, skipped at 600s, completed
        clock.set(at("2024-05-15T09:00:00Z"));
        engine.start(Some(SessionType::Work)).unwrap();
        engine.tick(1500).unwrap();

        clock.set(at("2024-05-15T10:00:00Z"));
        engine.start(Some(SessionType::Work)).unwrap();
        engine.tick(600).unwrap();
        engine.skip().unwrap();

        clock.set(at("2024-05-15T11:00:00Z"));
        engine.start(Some(SessionType::Work)).unwrap();
        engine.tick(1500).unwrap();

        // a break never counts
        engine.start(None).unwrap();
        engine.skip().unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.session_count().unwrap(), 5);

    let stats = StatsAggregator::load(&db).unwrap();
    let today = stats.today(&at("2024-05-15T20:00:00Z"));
    assert_eq!(today.completed_count, 2);
    assert_eq!(today.interrupted_count, 0);
    assert_eq!(today.total_actual_seconds, 3600);

    let all = stats.all_time(&Utc);
    assert_eq!(all.completed_count, 3);
    assert_eq!(all.total_actual_seconds, 5100);
    assert_eq!(all.distinct_active_days, 2);

    // 2024-05-12 is the Sunday starting this week, so yesterday is included.
    let week = stats.week(&at("2024-05-15T20:00:00Z"));
    assert_eq!(week.completed_count, 3);
}

#[test]
fn settings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");
    {
        let db = Database::open_at(&path).unwrap();
        let mut engine = TimerEngine::new(db, NullNotifier).unwrap();
        engine
            .update_settings(Settings {
                work_duration: 50 * 60,
                sessions_until_long_break: 3,
                ..Settings::default()
            })
            .unwrap();
    }
    let db = Database::open_at(&path).unwrap();
    let engine = TimerEngine::new(db, NullNotifier).unwrap();
    assert_eq!(engine.remaining_secs(), 3000);
    assert_eq!(engine.settings().sessions_until_long_break, 3);
}

#[test]
fn cycle_counter_restarts_with_process() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focustimer.db");
    {
        let db = Database::open_at(&path).unwrap();
        let mut engine = TimerEngine::new(db, NullNotifier).unwrap();
        engine.start(None).unwrap();
        engine.skip().unwrap();
        assert_eq!(engine.cycle_count(), 1);
    }
    let db = Database::open_at(&path).unwrap();
    let engine = TimerEngine::new(db, NullNotifier).unwrap();
    assert_eq!(engine.cycle_count(), 0);
    assert_eq!(engine.next_type(), Some(SessionType::Work));
}

#[test]
fn export_bundle_contains_everything() {
    let mut engine = TimerEngine::new(Database::open_memory().unwrap(), NullNotifier).unwrap();
    engine.start(None).unwrap();
    engine.reset().unwrap();

    let bundle = ExportBundle::collect(engine.store(), at("2024-05-15T20:00:00Z")).unwrap();
    assert_eq!(bundle.sessions.len(), 1);
    assert_eq!(bundle.sessions[0].outcome, Outcome::Interrupted);
    assert_eq!(bundle.settings, Settings::default());

    let json = serde_json::to_value(&bundle).unwrap();
    assert!(json["exportDate"].is_string());
    assert_eq!(json["sessions"][0]["type"], "work");
}
