//! Notification sink for session start/end messages.
//!
//! Delivery is best effort. Implementations must not block for long and
//! must swallow their own failures; the engine never looks at the outcome.

/// Receives human-readable messages from the engine.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);

    /// Play the end-of-session cue, if the front end has one.
    fn chime(&self) {}
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(target: "focustimer::notify", %title, %body, "notification");
    }

    fn chime(&self) {
        tracing::debug!(target: "focustimer::notify", "chime");
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, title: &str, body: &str) {
        (**self).notify(title, body)
    }

    fn chime(&self) {
        (**self).chime()
    }
}
