//! User-facing toast notifications.
//!
//! The app core only needs "show this short message"; how it is shown
//! is behind a trait so tests can capture messages instead.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Emits toasts as structured log lines.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(toast = message, "Toast");
    }
}

/// Collects toast messages for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_captures_messages_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("Copied");
        notifier.notify("Added");
        assert_eq!(notifier.messages(), vec!["Copied", "Added"]);
    }
}
