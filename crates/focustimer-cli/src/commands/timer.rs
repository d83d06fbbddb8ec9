//! Foreground timer.
//!
//! Starts a session and keeps the timer alive between sessions, so `start`
//! picks up the type the break policy chose. Events are printed to stdout as
//! JSON lines. Commands are read from stdin, one per line:
//!
//! | input            | action                                 |
//! |------------------|----------------------------------------|
//! | (empty line)     | toggle pause / resume                  |
//! | `n`, `start`     | start the next session                 |
//! | `p`, `pause`     | pause                                  |
//! | `r`, `resume`    | resume                                 |
//! | `s`, `skip`      | skip the current session               |
//! | `x`, `reset`     | interrupt and go idle                  |
//! | `q`, `quit`      | interrupt (if active) and exit         |
//! | `status`         | print a state snapshot                 |
//! | `retry`          | retry a failed save                    |
//! | `discard`        | drop sessions that failed to save      |
//!
//! When stdin closes the timer exits as soon as it is idle. It never exits
//! while a session is still unsaved.

use std::time::Duration;

use clap::Subcommand;
use focustimer_core::{
    Clock, Config, CoreError, Event, LogNotifier, Notifier, SessionStore, SessionType, Ticker,
    TimerEngine, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

/// How often the loop polls the monotonic clock.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Seconds between automatic save retries after a failed append.
const RETRY_EVERY_SECS: u64 = 5;
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session and run the timer in the foreground
    Run {
        /// Session type: work, short-break or long-break (default: work)
        #[arg(long = "type", value_parser = parse_session_type)]
        session_type: Option<SessionType>,
    },
}

fn parse_session_type(s: &str) -> Result<SessionType, String> {
    s.parse()
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { session_type } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(run_foreground(config, session_type));
            // A pending stdin read cannot be cancelled; don't wait for it.
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            result
        }
    }
}

async fn run_foreground(
    config: &Config,
    session_type: Option<SessionType>,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_store(config)?;
    let mut engine = TimerEngine::new(db, LogNotifier)?;
    emit(&engine.start(session_type)?)?;

    let mut ticker = Ticker::new();
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut since_retry = 0u64;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let secs = ticker.poll();
                advance(&mut engine, secs)?;
                if engine.pending_count() > 0 {
                    since_retry += secs;
                    if since_retry >= RETRY_EVERY_SECS {
                        since_retry = 0;
                        report(engine.retry_persist())?;
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(input) => {
                        // Account for time up to the command first.
                        advance(&mut engine, ticker.poll())?;
                        if handle_command(&mut engine, &mut ticker, input.trim())? == Flow::Quit {
                            break;
                        }
                    }
                    None => stdin_open = false,
                }
            }
        }

        if !stdin_open && engine.state() == TimerState::Idle && engine.pending_count() == 0 {
            break;
        }
    }
    Ok(())
}

/// Deliver elapsed seconds and print what happened. A minute-boundary
/// snapshot doubles as a progress line.
fn advance<S, N, C>(
    engine: &mut TimerEngine<S, N, C>,
    secs: u64,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: SessionStore,
    N: Notifier,
    C: Clock,
{
    if secs == 0 {
        return Ok(());
    }
    let before = engine.remaining_secs();
    report(engine.tick(secs))?;
    let after = engine.remaining_secs();
    if engine.state() == TimerState::Running && before / 60 != after / 60 {
        emit(&engine.snapshot())?;
    }
    Ok(())
}

fn handle_command<S, N, C>(
    engine: &mut TimerEngine<S, N, C>,
    ticker: &mut Ticker,
    input: &str,
) -> Result<Flow, Box<dyn std::error::Error>>
where
    S: SessionStore,
    N: Notifier,
    C: Clock,
{
    match input {
        "" => {
            let result = if engine.state() == TimerState::Paused {
                ticker.rearm();
                engine.resume()
            } else {
                engine.pause()
            };
            report(result.map(|e| vec![e]))?;
        }
        "n" | "start" => {
            ticker.rearm();
            report(engine.start(None).map(|e| vec![e]))?;
        }
        "p" | "pause" => report(engine.pause().map(|e| vec![e]))?,
        "r" | "resume" => {
            ticker.rearm();
            report(engine.resume().map(|e| vec![e]))?;
        }
        "s" | "skip" => report(engine.skip())?,
        "x" | "reset" => report(engine.reset())?,
        "q" | "quit" => {
            if matches!(engine.state(), TimerState::Running | TimerState::Paused) {
                report(engine.reset())?;
            }
            if engine.pending_count() > 0 {
                report(engine.retry_persist())?;
            }
            if engine.pending_count() > 0 {
                tracing::warn!(
                    unsaved = engine.pending_count(),
                    "not quitting with unsaved sessions; `retry` or `discard` first"
                );
                return Ok(Flow::Continue);
            }
            return Ok(Flow::Quit);
        }
        "status" => emit(&engine.snapshot())?,
        "retry" => report(engine.retry_persist())?,
        "discard" => report(engine.discard_pending())?,
        other => tracing::warn!(command = other, "unknown command"),
    }
    Ok(Flow::Continue)
}

/// Print events; log recoverable engine errors instead of aborting.
fn report(result: Result<Vec<Event>, CoreError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(events) => {
            for event in &events {
                emit(event)?;
            }
        }
        Err(CoreError::InvalidTransition(e)) => tracing::warn!(error = %e, "command ignored"),
        Err(CoreError::Persistence(e)) => {
            tracing::error!(error = %e, "session not saved; will retry (type `discard` to drop it)")
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn emit(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use focustimer_core::{
        MemoryStore, NullNotifier, PersistenceError, SessionRecord, Settings,
    };

    /// Memory store whose appends fail while `broken` is set.
    #[derive(Default)]
    struct BrokenDisk {
        inner: MemoryStore,
        broken: bool,
    }

    impl SessionStore for BrokenDisk {
        fn append_session(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
            if self.broken {
                return Err(PersistenceError::Unavailable("read-only file system".into()));
            }
            self.inner.append_session(record)
        }
        fn load_sessions(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
            self.inner.load_sessions()
        }
        fn load_settings(&self) -> Result<Option<Settings>, PersistenceError> {
            self.inner.load_settings()
        }
        fn write_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError> {
            self.inner.write_settings(settings)
        }
        fn clear_sessions(&mut self) -> Result<(), PersistenceError> {
            self.inner.clear_sessions()
        }
    }

    #[test]
    fn quit_waits_for_unsaved_session() {
        let store = BrokenDisk {
            broken: true,
            ..BrokenDisk::default()
        };
        let mut engine = TimerEngine::new(store, NullNotifier).unwrap();
        let mut ticker = Ticker::new();
        engine.start(None).unwrap();

        let flow = handle_command(&mut engine, &mut ticker, "q").unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.pending_count(), 1);

        engine.store_mut().broken = false;
        let flow = handle_command(&mut engine, &mut ticker, "q").unwrap();
        assert_eq!(flow, Flow::Quit);
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.store().inner.sessions().len(), 1);
    }

    #[test]
    fn start_uses_policy_choice() {
        let mut engine = TimerEngine::new(MemoryStore::new(), NullNotifier).unwrap();
        let mut ticker = Ticker::new();
        engine.start(None).unwrap();
        handle_command(&mut engine, &mut ticker, "s").unwrap();
        assert_eq!(engine.next_type(), Some(SessionType::ShortBreak));

        let flow = handle_command(&mut engine, &mut ticker, "n").unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            engine.current_session().map(|s| s.session_type),
            Some(SessionType::ShortBreak)
        );
    }
}
