use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use copydeck::app::App;
use copydeck::clipboard::{Monitor, SystemClipboard};
use copydeck::config::Settings;
use copydeck::events;
use copydeck::history::HistoryStore;
use copydeck::hotkeys::permission::{
    PermissionGate, PermissionPolicy, PermissionWatcher, SystemAccessibility,
};
use copydeck::hotkeys::registry::{spawn_hotkey_listener, GlobalHotkeyBackend, HotkeyRegistry};
use copydeck::logging;
use copydeck::notify::{LogNotifier, Notifier};
use copydeck::prefs::PrefStore;

const PERMISSION_POLL_INTERVAL: Duration = Duration::from_secs(2);

fn main() -> anyhow::Result<()> {
    let _logging_guard = logging::init();

    let prefs = PrefStore::open_default();
    let settings = Settings::load(&prefs);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let store = HistoryStore::load(prefs.clone(), settings.history_cap, notifier.clone());

    let accessibility = Arc::new(SystemAccessibility);
    let gate = PermissionGate::new(settings.permission_policy, accessibility.clone());
    let permission_watcher = match settings.permission_policy {
        PermissionPolicy::Required => {
            if !gate.allows() {
                warn!(guidance = gate.guidance(), "Accessibility permission not granted");
            }
            Some(PermissionWatcher::spawn(
                accessibility,
                PERMISSION_POLL_INTERVAL,
            ))
        }
        PermissionPolicy::Bypass => None,
    };

    let backend = GlobalHotkeyBackend::new()?;
    let registry = HotkeyRegistry::new(Box::new(backend), gate);

    let (tx, rx) = events::channel();

    let monitor_stop = Arc::new(AtomicBool::new(false));
    {
        let tx = tx.clone();
        let stop = monitor_stop.clone();
        let interval = Duration::from_millis(settings.poll_interval_ms);
        // The probe is thread-affine, so it is built on the monitor thread.
        std::thread::spawn(move || match SystemClipboard::new() {
            Ok(probe) => Monitor::new(probe, tx, interval).run(stop),
            Err(e) => warn!(error = %e, "Clipboard unavailable, monitor not started"),
        });
    }

    let probe = Box::new(SystemClipboard::new()?);
    let mut app = App::new(store, registry, settings, prefs, probe, notifier, tx, rx);
    let restored = app.register_saved_shortcuts();
    info!(shortcuts = restored, "copydeck ready");

    spawn_hotkey_listener(app.registry.resolver(), app.sender());

    app.run();

    monitor_stop.store(true, Ordering::Relaxed);
    if let Some(watcher) = permission_watcher {
        watcher.stop();
    }
    Ok(())
}
