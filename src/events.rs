//! Events flowing from background threads into the main app loop.
//!
//! Hotkey presses, clipboard changes, and delayed UI actions all arrive
//! on one bounded channel so the app state is only touched from one place.

use std::time::Duration;

use async_channel::{Receiver, Sender};
use tracing::warn;

use crate::history::entry::Payload;
use crate::hotkeys::registry::RegistrationId;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A registered global shortcut was pressed.
    HotkeyFired(RegistrationId),
    /// The system clipboard changed to new content.
    ClipboardChanged(Payload),
    /// Delayed hide after a copy action.
    HideAfterCopy,
    /// Delayed clear of the copied-entry highlight.
    ClearSelection,
    /// Stop the event loop.
    Shutdown,
}

pub fn channel() -> (Sender<AppEvent>, Receiver<AppEvent>) {
    async_channel::bounded(32)
}

/// Deliver `event` after `delay` from a short-lived thread.
///
/// Dropped receivers are fine: the send just fails and is logged.
pub fn schedule(tx: Sender<AppEvent>, delay: Duration, event: AppEvent) {
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        if let Err(e) = tx.send_blocking(event) {
            warn!(error = %e, "Scheduled event dropped, channel closed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_delivers_events_in_order() {
        let (tx, rx) = channel();
        tx.send_blocking(AppEvent::HotkeyFired(1)).unwrap();
        tx.send_blocking(AppEvent::Shutdown).unwrap();
        assert_eq!(rx.recv_blocking().unwrap(), AppEvent::HotkeyFired(1));
        assert_eq!(rx.recv_blocking().unwrap(), AppEvent::Shutdown);
    }

    #[test]
    fn schedule_delivers_after_delay() {
        let (tx, rx) = channel();
        schedule(tx, Duration::from_millis(10), AppEvent::ClearSelection);
        assert_eq!(rx.recv_blocking().unwrap(), AppEvent::ClearSelection);
    }
}
