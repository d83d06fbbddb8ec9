//! Session scheduler.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads or timers: the caller delivers elapsed seconds through `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Idle
//!            \          /
//!             AwaitingPersist (append failed) -> Idle
//! ```
//!
//! `reset()` always lands in `Idle`. An interrupted session whose append
//! fails is set aside as unsaved instead of blocking the timer; so is the
//! record held by `AwaitingPersist` when a reset arrives. `retry_persist()`
//! stores the set-aside records from any state.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(store, LogNotifier)?;
//! engine.start(None)?;
//! // once per second:
//! for event in engine.tick(1)? { /* render */ }
//! ```

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::policy::{next_session_type, CycleCounter};
use super::session::{format_clock, ActiveSession, Outcome, SessionRecord, SessionType};
use super::settings::Settings;
use crate::error::{CoreError, Result, TransitionError};
use crate::events::Event;
use crate::notify::Notifier;
use crate::storage::{load_settings_or_default, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// A session ended but its record has not been stored yet.
    AwaitingPersist,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::AwaitingPersist => "awaiting persistence",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
enum Phase {
    /// Nothing active; `remaining` is preloaded for `next`.
    Idle { next: SessionType, remaining: u64 },
    Running { session: ActiveSession, remaining: u64 },
    Paused { session: ActiveSession, remaining: u64 },
    AwaitingPersist { record: SessionRecord },
}

impl Phase {
    fn state(&self) -> TimerState {
        match self {
            Phase::Idle { .. } => TimerState::Idle,
            Phase::Running { .. } => TimerState::Running,
            Phase::Paused { .. } => TimerState::Paused,
            Phase::AwaitingPersist { .. } => TimerState::AwaitingPersist,
        }
    }
}

/// Core scheduler.
///
/// Owns the active session, the countdown and the cycle counter. Records go
/// to the injected [`SessionStore`]; messages go to the [`Notifier`].
/// Every command takes `&mut self`, so ticks and commands never interleave.
pub struct TimerEngine<S, N, C = SystemClock> {
    store: S,
    notifier: N,
    clock: C,
    settings: Settings,
    phase: Phase,
    cycle: CycleCounter,
    /// Terminated records set aside after a failed append, oldest first.
    unsaved: Vec<SessionRecord>,
}

impl<S: SessionStore, N: Notifier> TimerEngine<S, N, SystemClock> {
    /// Create an engine using the system clock. Settings are read from the
    /// store (defaults if none were saved).
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn new(store: S, notifier: N) -> Result<Self> {
        Self::with_clock(store, notifier, SystemClock)
    }
}

impl<S: SessionStore, N: Notifier, C: Clock> TimerEngine<S, N, C> {
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn with_clock(store: S, notifier: N, clock: C) -> Result<Self> {
        let settings = load_settings_or_default(&store)?;
        let phase = Phase::Idle {
            next: SessionType::Work,
            remaining: settings.work_duration,
        };
        Ok(Self {
            store,
            notifier,
            clock,
            settings,
            phase,
            cycle: CycleCounter::new(),
            unsaved: Vec::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.phase.state()
    }

    pub fn remaining_secs(&self) -> u64 {
        match &self.phase {
            Phase::Idle { remaining, .. }
            | Phase::Running { remaining, .. }
            | Phase::Paused { remaining, .. } => *remaining,
            Phase::AwaitingPersist { .. } => 0,
        }
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle.get()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_session(&self) -> Option<&ActiveSession> {
        match &self.phase {
            Phase::Running { session, .. } | Phase::Paused { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Type the next `start(None)` will use. Only set while idle.
    pub fn next_type(&self) -> Option<SessionType> {
        match &self.phase {
            Phase::Idle { next, .. } => Some(*next),
            _ => None,
        }
    }

    /// The oldest record held back by a failed append.
    pub fn pending_record(&self) -> Option<&SessionRecord> {
        match &self.phase {
            Phase::AwaitingPersist { record } => Some(record),
            _ => self.unsaved.first(),
        }
    }

    /// Number of terminated sessions not yet in the store.
    pub fn pending_count(&self) -> usize {
        let held = usize::from(self.state() == TimerState::AwaitingPersist);
        held + self.unsaved.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Seconds of the session the countdown belongs to.
    pub fn total_secs(&self) -> u64 {
        match &self.phase {
            Phase::Idle { next, .. } => self.settings.duration_for(*next),
            Phase::Running { session, .. } | Phase::Paused { session, .. } => {
                session.planned_duration
            }
            Phase::AwaitingPersist { record } => record.planned_duration,
        }
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs() as f64 / total as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let session_type = match &self.phase {
            Phase::Idle { next, .. } => *next,
            Phase::Running { session, .. } | Phase::Paused { session, .. } => session.session_type,
            Phase::AwaitingPersist { record } => record.session_type,
        };
        Event::StateSnapshot {
            state: self.state(),
            session_type,
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs(),
            progress: self.progress(),
            cycle_count: self.cycle.get(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session. `None` uses the type preloaded while idle.
    ///
    /// # Errors
    /// `InvalidTransition` unless idle.
    pub fn start(&mut self, session_type: Option<SessionType>) -> Result<Event> {
        match &self.phase {
            Phase::Idle { next, .. } => {
                let session_type = session_type.unwrap_or(*next);
                Ok(self.begin(session_type))
            }
            other => Err(rejected("start", other.state())),
        }
    }

    /// # Errors
    /// `InvalidTransition` unless running.
    pub fn pause(&mut self) -> Result<Event> {
        match self.take_phase() {
            Phase::Running { session, remaining } => {
                self.phase = Phase::Paused { session, remaining };
                tracing::debug!(remaining, "session paused");
                Ok(Event::SessionPaused {
                    remaining_secs: remaining,
                    at: self.clock.now(),
                })
            }
            other => self.restore_and_reject("pause", other),
        }
    }

    /// # Errors
    /// `InvalidTransition` unless paused.
    pub fn resume(&mut self) -> Result<Event> {
        match self.take_phase() {
            Phase::Paused { session, remaining } => {
                self.phase = Phase::Running { session, remaining };
                tracing::debug!(remaining, "session resumed");
                Ok(Event::SessionResumed {
                    remaining_secs: remaining,
                    at: self.clock.now(),
                })
            }
            other => self.restore_and_reject("resume", other),
        }
    }

    /// Deliver `secs` elapsed seconds. Ignored unless running.
    ///
    /// # Errors
    /// `Persistence` if the session completed and its record could not be
    /// stored; the engine is then `AwaitingPersist`.
    pub fn tick(&mut self, secs: u64) -> Result<Vec<Event>> {
        if secs == 0 {
            return Ok(Vec::new());
        }
        match &mut self.phase {
            Phase::Running { remaining, .. } => {
                *remaining = remaining.saturating_sub(secs);
                if *remaining > 0 {
                    return Ok(Vec::new());
                }
            }
            _ => return Ok(Vec::new()),
        }

        match self.take_phase() {
            Phase::Running { session, remaining } => {
                self.terminate(session, remaining, Outcome::Completed)
            }
            other => {
                self.phase = other;
                Ok(Vec::new())
            }
        }
    }

    /// End the active session early and move on as if it had completed.
    ///
    /// # Errors
    /// `InvalidTransition` unless running or paused; `Persistence` if the
    /// record could not be stored.
    pub fn skip(&mut self) -> Result<Vec<Event>> {
        match self.take_phase() {
            Phase::Running { session, remaining } | Phase::Paused { session, remaining } => {
                self.terminate(session, remaining, Outcome::Skipped)
            }
            other => self.restore_and_reject("skip", other),
        }
    }

    /// Interrupt the active session and return to an idle Work countdown.
    /// The engine is `Idle` afterwards whatever happens.
    ///
    /// While idle this only re-arms the Work countdown. While awaiting
    /// persistence the held record is set aside unsaved.
    ///
    /// # Errors
    /// `Persistence` if the interrupted record could not be stored. The
    /// engine is still idle; the record waits for `retry_persist`.
    pub fn reset(&mut self) -> Result<Vec<Event>> {
        match self.take_phase() {
            Phase::Running { session, remaining } | Phase::Paused { session, remaining } => {
                self.terminate(session, remaining, Outcome::Interrupted)
            }
            Phase::Idle { .. } => {
                self.phase = self.idle_work();
                Ok(vec![self.timer_reset()])
            }
            Phase::AwaitingPersist { record } => {
                tracing::warn!(session_id = %record.id, "reset while unsaved, record set aside");
                self.unsaved.push(record);
                self.phase = self.idle_work();
                Ok(vec![self.timer_reset()])
            }
        }
    }

    /// Try again to store records held back by failed appends.
    ///
    /// From `AwaitingPersist` the held record is stored and the session
    /// concludes as it would have. Set-aside records are stored from any
    /// state, oldest first.
    ///
    /// # Errors
    /// `InvalidTransition` if nothing is pending; `Persistence` if an append
    /// fails again. Records stored before the failure stay stored.
    pub fn retry_persist(&mut self) -> Result<Vec<Event>> {
        match self.take_phase() {
            Phase::AwaitingPersist { record } => {
                let mut events = match self.flush_unsaved() {
                    Ok(events) => events,
                    Err(e) => {
                        self.phase = Phase::AwaitingPersist { record };
                        return Err(e);
                    }
                };
                events.extend(self.persist_and_conclude(record)?);
                Ok(events)
            }
            other if !self.unsaved.is_empty() => {
                self.phase = other;
                self.flush_unsaved()
            }
            other => self.restore_and_reject("retry persistence", other),
        }
    }

    /// Give up on every record held back by a failed append. From
    /// `AwaitingPersist` the engine goes idle.
    ///
    /// # Errors
    /// `InvalidTransition` if nothing is pending.
    pub fn discard_pending(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        match self.take_phase() {
            Phase::AwaitingPersist { record } => events.push(self.drop_pending(record)),
            other if !self.unsaved.is_empty() => self.phase = other,
            other => return self.restore_and_reject("discard", other),
        }
        for record in std::mem::take(&mut self.unsaved) {
            tracing::warn!(session_id = %record.id, "discarding unsaved session");
            events.push(Event::PendingDiscarded {
                session_id: record.id,
                at: self.clock.now(),
            });
        }
        Ok(events)
    }

    /// Validate, persist and apply new settings.
    ///
    /// An active session keeps its planned duration. While idle the
    /// preloaded countdown follows the new duration.
    ///
    /// # Errors
    /// `Config` if the settings break an invariant, `Persistence` if they
    /// cannot be saved. The previous settings stay in effect either way.
    pub fn update_settings(&mut self, settings: Settings) -> Result<Event> {
        self.store.save_settings(&settings)?;
        if let Phase::Idle { next, remaining } = &mut self.phase {
            *remaining = settings.duration_for(*next);
        }
        self.settings = settings;
        tracing::debug!("settings updated");
        Ok(Event::SettingsUpdated {
            at: self.clock.now(),
        })
    }

    /// Wipe the session log and start over from an idle Work countdown.
    /// An active session and any unsaved records are dropped.
    ///
    /// # Errors
    /// `Persistence` if the store cannot be cleared; nothing changes then.
    pub fn clear_history(&mut self) -> Result<Event> {
        self.store.clear_sessions()?;
        self.phase = self.idle_work();
        self.unsaved.clear();
        self.cycle.clear();
        tracing::info!("session history cleared");
        Ok(Event::HistoryCleared {
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn idle_work(&self) -> Phase {
        Phase::Idle {
            next: SessionType::Work,
            remaining: self.settings.work_duration,
        }
    }

    /// Move the phase out. Every caller puts a phase back before returning.
    fn take_phase(&mut self) -> Phase {
        let placeholder = self.idle_work();
        std::mem::replace(&mut self.phase, placeholder)
    }

    fn restore_and_reject<T>(&mut self, op: &'static str, phase: Phase) -> Result<T> {
        let state = phase.state();
        self.phase = phase;
        Err(rejected(op, state))
    }

    fn begin(&mut self, session_type: SessionType) -> Event {
        let duration = self.settings.duration_for(session_type);
        let session = ActiveSession::begin(session_type, duration, self.clock.now());
        let event = Event::SessionStarted {
            session_id: session.id,
            session_type,
            duration_secs: duration,
            at: session.start_time,
        };
        tracing::info!(
            session_id = %session.id,
            session_type = session_type.as_str(),
            duration,
            "session started"
        );
        self.phase = Phase::Running {
            session,
            remaining: duration,
        };
        if self.settings.notifications_enabled {
            self.notifier.notify(
                &format!("{} started", session_type.display_name()),
                &format!("Duration: {}", format_clock(duration)),
            );
        }
        event
    }

    fn terminate(
        &mut self,
        session: ActiveSession,
        remaining: u64,
        outcome: Outcome,
    ) -> Result<Vec<Event>> {
        let record = session.finalize(remaining, outcome, self.clock.now());
        self.persist_and_conclude(record)
    }

    fn timer_reset(&self) -> Event {
        Event::TimerReset {
            at: self.clock.now(),
        }
    }

    /// Store the record, then conclude. A failed append holds completed and
    /// skipped records in `AwaitingPersist`; an interrupted one concludes
    /// anyway and is set aside.
    fn persist_and_conclude(&mut self, record: SessionRecord) -> Result<Vec<Event>> {
        if let Err(e) = self.store.append_session(&record) {
            tracing::warn!(session_id = %record.id, error = %e, "failed to store session");
            if record.outcome == Outcome::Interrupted {
                self.conclude(record.clone());
                self.unsaved.push(record);
            } else {
                self.phase = Phase::AwaitingPersist { record };
            }
            return Err(CoreError::Persistence(e));
        }
        Ok(self.conclude(record))
    }

    fn flush_unsaved(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(record) = self.unsaved.first() {
            self.store.append_session(record)?;
            let record = self.unsaved.remove(0);
            tracing::info!(session_id = %record.id, "unsaved session stored");
            events.push(Event::PendingSaved {
                session_id: record.id,
                at: self.clock.now(),
            });
        }
        Ok(events)
    }

    /// Runs once the record is stored: counter, next type, notification,
    /// then idle or auto-start.
    fn conclude(&mut self, record: SessionRecord) -> Vec<Event> {
        let interrupted = record.outcome == Outcome::Interrupted;
        self.cycle.record(record.session_type, record.outcome);

        let next_type = if interrupted {
            SessionType::Work
        } else {
            next_session_type(
                record.session_type,
                self.cycle,
                self.settings.sessions_until_long_break,
            )
        };
        let next_duration = self.settings.duration_for(next_type);
        let auto_start = !interrupted && self.settings.auto_starts(next_type);

        tracing::info!(
            session_id = %record.id,
            session_type = record.session_type.as_str(),
            outcome = record.outcome.as_str(),
            actual = record.actual_duration,
            cycle = self.cycle.get(),
            next = next_type.as_str(),
            "session ended"
        );
        self.announce_end(&record, next_type, next_duration);

        self.phase = Phase::Idle {
            next: next_type,
            remaining: next_duration,
        };
        let mut events = vec![Event::SessionEnded {
            at: record.end_time,
            record,
            cycle_count: self.cycle.get(),
            next_type,
            next_duration_secs: next_duration,
            auto_start,
        }];
        if auto_start {
            events.push(self.begin(next_type));
        }
        events
    }

    fn announce_end(&self, record: &SessionRecord, next_type: SessionType, next_duration: u64) {
        if self.settings.sound_enabled && record.outcome != Outcome::Interrupted {
            self.notifier.chime();
        }
        if !self.settings.notifications_enabled {
            return;
        }
        let name = record.session_type.display_name();
        let title = match record.outcome {
            Outcome::Completed => format!("{name} complete!"),
            Outcome::Skipped => format!("{name} skipped"),
            Outcome::Interrupted => format!("{name} interrupted"),
        };
        let body = format!(
            "Next: {} ({})",
            next_type.display_name(),
            format_clock(next_duration)
        );
        self.notifier.notify(&title, &body);
    }

    fn drop_pending(&mut self, record: SessionRecord) -> Event {
        tracing::warn!(session_id = %record.id, "discarding unsaved session");
        self.phase = self.idle_work();
        Event::PendingDiscarded {
            session_id: record.id,
            at: self.clock.now(),
        }
    }
}

fn rejected(op: &'static str, state: TimerState) -> CoreError {
    CoreError::InvalidTransition(TransitionError { op, state })
}
