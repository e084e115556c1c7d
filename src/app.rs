//! The app core: owns the store, registry, and visibility state, and
//! consumes the event channel that background threads feed.

use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clipboard::ClipboardProbe;
use crate::config::{SavedShortcut, Settings};
use crate::error::{CopydeckError, ResultExt};
use crate::events::{self, AppEvent};
use crate::history::{HistoryStore, Payload};
use crate::hotkeys::{Combo, HotkeyRegistry, RegistrationId};
use crate::notify::Notifier;
use crate::prefs::PrefStore;

/// Highlight lingers briefly after a copy, then clears.
const CLEAR_SELECTION_DELAY: Duration = Duration::from_millis(1500);
/// The window auto-hides shortly after a copy action.
const HIDE_AFTER_COPY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Hidden,
    Visible,
}

/// Window visibility state machine. The actual window chrome reacts to
/// these transitions; the core only tracks and logs them.
pub struct Visibility {
    state: VisibilityState,
}

impl Visibility {
    pub fn new() -> Self {
        Self {
            state: VisibilityState::Hidden,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state == VisibilityState::Visible
    }

    pub fn show(&mut self) {
        if self.state != VisibilityState::Visible {
            info!("Window shown");
            self.state = VisibilityState::Visible;
        }
    }

    pub fn hide(&mut self) {
        if self.state != VisibilityState::Hidden {
            info!("Window hidden");
            self.state = VisibilityState::Hidden;
        }
    }

    pub fn toggle(&mut self) {
        if self.is_visible() {
            self.hide();
        } else {
            self.show();
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new()
    }
}

pub struct App {
    pub store: HistoryStore,
    pub registry: HotkeyRegistry,
    pub visibility: Visibility,
    pub settings: Settings,
    prefs: PrefStore,
    probe: Box<dyn ClipboardProbe>,
    notifier: Arc<dyn Notifier>,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl App {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: HistoryStore,
        registry: HotkeyRegistry,
        settings: Settings,
        prefs: PrefStore,
        probe: Box<dyn ClipboardProbe>,
        notifier: Arc<dyn Notifier>,
        tx: Sender<AppEvent>,
        rx: Receiver<AppEvent>,
    ) -> Self {
        Self {
            store,
            registry,
            visibility: Visibility::new(),
            settings,
            prefs,
            probe,
            notifier,
            tx,
            rx,
        }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }

    /// Re-register every saved shortcut from a clean slate. Individual
    /// failures are logged and skipped. Returns the number registered.
    pub fn register_saved_shortcuts(&mut self) -> usize {
        self.registry.unregister_all();
        let mut registered = 0;
        for saved in &self.settings.shortcuts {
            let combo = match Combo::parse(&saved.combo) {
                Ok(combo) => combo,
                Err(e) => {
                    warn!(combo = %saved.combo, error = %e, "Skipping unparseable saved shortcut");
                    continue;
                }
            };
            match self.registry.register(combo) {
                Ok(id) => {
                    debug!(combo = %saved.combo, id = id, "Restored saved shortcut");
                    registered += 1;
                }
                Err(e) => {
                    warn!(combo = %saved.combo, error = %e, "Failed to restore saved shortcut");
                }
            }
        }
        info!(registered = registered, "Saved shortcuts registered");
        registered
    }

    /// Parse, register, and persist a new shortcut. Failures leave the
    /// saved list untouched and surface a toast.
    pub fn add_shortcut(&mut self, raw: &str) -> Result<RegistrationId, CopydeckError> {
        let result = self.try_add_shortcut(raw);
        if let Err(e) = &result {
            warn!(combo = raw, error = %e, "Shortcut not added");
            self.notifier.notify(&e.user_message());
        }
        result
    }

    fn try_add_shortcut(&mut self, raw: &str) -> Result<RegistrationId, CopydeckError> {
        let combo = Combo::parse(raw)?;
        let canonical = combo.canonical();
        let id = self.registry.register(combo)?;
        if !self.settings.has_shortcut(&canonical) {
            self.settings.shortcuts.push(SavedShortcut::new(canonical));
            self.settings
                .save(&self.prefs)
                .map_err(|source| CopydeckError::Persist {
                    what: "settings",
                    source,
                })?;
        }
        self.notifier.notify("Shortcut saved");
        Ok(id)
    }

    /// Unregister a shortcut and drop it from the saved list.
    pub fn remove_shortcut(&mut self, canonical: &str) -> bool {
        let removed = self.registry.unregister(canonical);
        let before = self.settings.shortcuts.len();
        self.settings.shortcuts.retain(|s| s.combo != canonical);
        if self.settings.shortcuts.len() != before {
            self.settings.save(&self.prefs).log_err();
        }
        removed
    }

    /// Copy a history entry back to the pasteboard, highlight it, and
    /// schedule the highlight clear and post-copy hide.
    pub fn copy_entry(&mut self, id: Uuid) -> bool {
        let Some(payload) = self.store.mark_copied(id) else {
            return false;
        };
        let written = match &payload {
            Payload::Text { text } => self.probe.write_text(text),
            Payload::Image { png } => self.probe.write_image(png),
        };
        if written.log_err().is_none() {
            self.notifier.notify("Copy failed");
            return false;
        }
        self.notifier.notify("Copied");
        events::schedule(self.tx.clone(), CLEAR_SELECTION_DELAY, AppEvent::ClearSelection);
        if self.visibility.is_visible() {
            events::schedule(self.tx.clone(), HIDE_AFTER_COPY_DELAY, AppEvent::HideAfterCopy);
        }
        true
    }

    /// Serialize text entries for a save dialog, toasting the count.
    pub fn export_history(&self) -> String {
        let text = self.store.export_as_text();
        let count = self
            .store
            .view()
            .iter()
            .filter(|e| !e.payload.is_image())
            .count();
        let message = if count == 1 {
            "Exported 1 item".to_string()
        } else {
            format!("Exported {} items", count)
        };
        self.notifier.notify(&message);
        text
    }

    /// Apply one event. Returns false when the loop should stop.
    ///
    /// Delayed events are idempotent: they check current state before
    /// acting, so a stale one is a no-op.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::HotkeyFired(id) => {
                if self.registry.combo_for(id).is_some() {
                    debug!(id = id, "Hotkey toggled window");
                    self.visibility.toggle();
                } else {
                    debug!(id = id, "Ignoring fired hotkey with no registration");
                }
            }
            AppEvent::ClipboardChanged(payload) => {
                self.store.record_from_clipboard(payload);
            }
            AppEvent::HideAfterCopy => {
                if self.visibility.is_visible() {
                    self.visibility.hide();
                }
            }
            AppEvent::ClearSelection => {
                self.store.clear_selection();
            }
            AppEvent::Shutdown => {
                info!("Shutting down event loop");
                return false;
            }
        }
        true
    }

    /// Block on the event channel until shutdown or all senders drop.
    pub fn run(&mut self) {
        info!("Event loop started");
        while let Ok(event) = self.rx.recv_blocking() {
            if !self.handle_event(event) {
                break;
            }
        }
        info!("Event loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::history::RecordOutcome;
    use crate::hotkeys::registry::{HotkeyBackend, RegisterError};
    use crate::hotkeys::PermissionGate;
    use crate::notify::RecordingNotifier;
    use tempfile::tempdir;

    struct CountingBackend {
        next_handle: u32,
    }

    impl HotkeyBackend for CountingBackend {
        fn register(&mut self, _combo: &Combo) -> Result<u32, RegisterError> {
            let handle = self.next_handle;
            self.next_handle += 1;
            Ok(handle)
        }

        fn unregister(&mut self, _handle: u32) -> Result<(), RegisterError> {
            Ok(())
        }
    }

    fn test_app() -> (App, Arc<RecordingNotifier>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let prefs = PrefStore::at(dir.path());
        let notifier = RecordingNotifier::new();
        let settings = Settings::load(&prefs);
        let store = HistoryStore::load(prefs.clone(), settings.history_cap, notifier.clone());
        let registry = HotkeyRegistry::new(
            Box::new(CountingBackend { next_handle: 1 }),
            PermissionGate::bypass(),
        );
        let (tx, rx) = events::channel();
        let app = App::new(
            store,
            registry,
            settings,
            prefs,
            Box::new(MemoryClipboard::new()),
            notifier.clone(),
            tx,
            rx,
        );
        (app, notifier, dir)
    }

    #[test]
    fn hotkey_event_toggles_visibility() {
        let (mut app, _, _dir) = test_app();
        let id = app.add_shortcut("cmd+shift+v").unwrap();
        assert!(!app.visibility.is_visible());
        app.handle_event(AppEvent::HotkeyFired(id));
        assert!(app.visibility.is_visible());
        app.handle_event(AppEvent::HotkeyFired(id));
        assert!(!app.visibility.is_visible());
    }

    #[test]
    fn unknown_hotkey_ids_are_ignored() {
        let (mut app, _, _dir) = test_app();
        app.handle_event(AppEvent::HotkeyFired(999));
        assert!(!app.visibility.is_visible());
    }

    #[test]
    fn clipboard_event_records_into_history() {
        let (mut app, _, _dir) = test_app();
        app.handle_event(AppEvent::ClipboardChanged(Payload::text("from pasteboard")));
        assert_eq!(app.store.len(), 1);
    }

    #[test]
    fn add_shortcut_persists_and_is_idempotent() {
        let (mut app, _, dir) = test_app();
        let first = app.add_shortcut("⌘⇧V").unwrap();
        let second = app.add_shortcut("cmd+shift+v").unwrap();
        assert_eq!(first, second);
        assert_eq!(app.settings.shortcuts.len(), 1);
        let reloaded = Settings::load(&PrefStore::at(dir.path()));
        assert!(reloaded.has_shortcut("cmd+shift+v"));
    }

    #[test]
    fn rejected_shortcut_is_not_persisted_and_toasts() {
        let (mut app, notifier, _dir) = test_app();
        assert!(app.add_shortcut("cmd+c").is_err());
        assert!(app.settings.shortcuts.is_empty());
        assert!(notifier
            .messages()
            .iter()
            .any(|m| m.contains("reserved")));
    }

    #[test]
    fn invalid_shortcut_surfaces_parse_toast() {
        let (mut app, notifier, _dir) = test_app();
        assert!(app.add_shortcut("v").is_err());
        assert!(notifier
            .messages()
            .iter()
            .any(|m| m.contains("Invalid shortcut")));
    }

    #[test]
    fn remove_shortcut_unregisters_and_forgets() {
        let (mut app, _, _dir) = test_app();
        app.add_shortcut("cmd+shift+v").unwrap();
        assert!(app.remove_shortcut("cmd+shift+v"));
        assert!(app.registry.is_empty());
        assert!(app.settings.shortcuts.is_empty());
        assert!(!app.remove_shortcut("cmd+shift+v"));
    }

    #[test]
    fn saved_shortcuts_replay_on_startup() {
        let (mut app, _, _dir) = test_app();
        app.settings.shortcuts.push(SavedShortcut::new("cmd+shift+v"));
        app.settings.shortcuts.push(SavedShortcut::new("ctrl+alt+k"));
        app.settings.shortcuts.push(SavedShortcut::new("not a combo !!"));
        assert_eq!(app.register_saved_shortcuts(), 2);
        assert_eq!(app.registry.len(), 2);
    }

    #[test]
    fn copy_entry_writes_pasteboard_and_selects() {
        let (mut app, notifier, _dir) = test_app();
        let id = app.store.insert(Payload::text("take me"), false);
        assert!(app.copy_entry(id));
        assert_eq!(app.probe.read_text(), Some("take me".into()));
        assert_eq!(app.store.selected(), Some(id));
        assert!(notifier.messages().contains(&"Copied".to_string()));
    }

    #[test]
    fn copy_of_unknown_entry_is_rejected() {
        let (mut app, _, _dir) = test_app();
        assert!(!app.copy_entry(Uuid::new_v4()));
    }

    #[test]
    fn stale_hide_and_clear_events_are_noops() {
        let (mut app, _, _dir) = test_app();
        app.handle_event(AppEvent::HideAfterCopy);
        assert!(!app.visibility.is_visible());
        app.handle_event(AppEvent::ClearSelection);
        assert_eq!(app.store.selected(), None);
    }

    #[test]
    fn export_history_toasts_text_entry_count() {
        let (mut app, notifier, _dir) = test_app();
        app.store.insert(Payload::text("one"), false);
        app.store.insert(Payload::text("two"), true);
        app.store.insert(Payload::image(vec![1]), false);
        let exported = app.export_history();
        assert!(exported.contains("[FAVORITE] two"));
        assert!(notifier
            .messages()
            .contains(&"Exported 2 items".to_string()));
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let (mut app, _, _dir) = test_app();
        assert!(app.handle_event(AppEvent::ClipboardChanged(Payload::text("x"))));
        assert!(!app.handle_event(AppEvent::Shutdown));
    }

    #[test]
    fn repeated_clipboard_events_keep_history_deduped() {
        let (mut app, _, _dir) = test_app();
        app.handle_event(AppEvent::ClipboardChanged(Payload::text("dup")));
        app.handle_event(AppEvent::ClipboardChanged(Payload::text("dup")));
        assert_eq!(app.store.len(), 1);
        assert!(matches!(
            app.store.record_from_clipboard(Payload::text("dup")),
            RecordOutcome::Bumped(_)
        ));
    }
}
