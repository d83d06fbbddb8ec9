use serde::{Deserialize, Serialize};

use super::session::{Outcome, SessionType};

/// Number of Work sessions finished (completed or skipped) since the
/// scheduler was created. Lives only in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCounter(u32);

impl CycleCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Record a terminated session. Returns true if the counter moved.
    pub fn record(&mut self, session_type: SessionType, outcome: Outcome) -> bool {
        if session_type == SessionType::Work && outcome.counts_toward_cycle() {
            self.0 = self.0.saturating_add(1);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Pick the type that follows `ended`, given the counter value after the
/// ended session was recorded.
pub fn next_session_type(
    ended: SessionType,
    cycle: CycleCounter,
    sessions_until_long_break: u32,
) -> SessionType {
    match ended {
        SessionType::Work => {
            let cycle_len = sessions_until_long_break.max(1);
            if cycle.get() % cycle_len == 0 {
                SessionType::LongBreak
            } else {
                SessionType::ShortBreak
            }
        }
        SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_break_every_fourth_work_session() {
        let mut cycle = CycleCounter::new();
        let mut seen = Vec::new();
        for _ in 0..8 {
            cycle.record(SessionType::Work, Outcome::Completed);
            seen.push(next_session_type(SessionType::Work, cycle, 4));
        }
        use SessionType::{LongBreak as L, ShortBreak as S};
        assert_eq!(seen, vec![S, S, S, L, S, S, S, L]);
    }

    #[test]
    fn breaks_always_return_to_work() {
        let cycle = CycleCounter::new();
        assert_eq!(next_session_type(SessionType::ShortBreak, cycle, 4), SessionType::Work);
        assert_eq!(next_session_type(SessionType::LongBreak, cycle, 4), SessionType::Work);
    }

    #[test]
    fn only_finished_work_moves_the_counter() {
        let mut cycle = CycleCounter::new();
        assert!(!cycle.record(SessionType::Work, Outcome::Interrupted));
        assert!(!cycle.record(SessionType::ShortBreak, Outcome::Completed));
        assert!(!cycle.record(SessionType::LongBreak, Outcome::Skipped));
        assert_eq!(cycle.get(), 0);
        assert!(cycle.record(SessionType::Work, Outcome::Skipped));
        assert!(cycle.record(SessionType::Work, Outcome::Completed));
        assert_eq!(cycle.get(), 2);
    }

    #[test]
    fn cycle_of_one_always_long() {
        let mut cycle = CycleCounter::new();
        for _ in 0..3 {
            cycle.record(SessionType::Work, Outcome::Completed);
            assert_eq!(next_session_type(SessionType::Work, cycle, 1), SessionType::LongBreak);
        }
    }
}
