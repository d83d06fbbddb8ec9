mod clock;
mod engine;
mod policy;
mod session;
mod settings;

pub use clock::{Clock, ManualClock, SystemClock, Ticker};
pub use engine::{TimerEngine, TimerState};
pub use policy::{next_session_type, CycleCounter};
pub use session::{format_clock, ActiveSession, Outcome, SessionRecord, SessionType};
pub use settings::Settings;
