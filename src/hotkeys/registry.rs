//! Global shortcut registration and the OS event listener.
//!
//! Registrations are keyed by a locally assigned monotonic id, never by
//! the OS handle, so ids stay collision-free across the process
//! lifetime. The OS backend sits behind a trait so the registry logic is
//! testable without touching real system hotkeys.

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::Sender;
use global_hotkey::hotkey::{Code, HotKey, Modifiers as OsModifiers};
use global_hotkey::{Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::events::AppEvent;
use crate::hotkeys::combo::{Combo, ComboParseError};
use crate::hotkeys::permission::PermissionGate;

/// Locally assigned registration identifier, stable for the lifetime of
/// a registration.
pub type RegistrationId = u32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error(transparent)]
    InvalidCombo(#[from] ComboParseError),
    #[error("'{0}' is a reserved system shortcut")]
    Reserved(String),
    #[error("accessibility permission required")]
    PermissionDenied,
    #[error("system rejected shortcut: {0}")]
    Backend(String),
}

impl RegisterError {
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCombo(e) => format!("Invalid shortcut: {}", e),
            Self::Reserved(combo) => format!("{} is reserved by the system", combo),
            Self::PermissionDenied => {
                "Accessibility permission is required for global shortcuts".to_string()
            }
            Self::Backend(msg) => format!("Could not register shortcut: {}", msg),
        }
    }
}

/// OS-level binding of a combo to a process-wide handle. Stays on the
/// thread that created it; the listener only sees the shared handle map.
pub trait HotkeyBackend {
    fn register(&mut self, combo: &Combo) -> Result<u32, RegisterError>;
    fn unregister(&mut self, handle: u32) -> Result<(), RegisterError>;
}

/// Real backend over the `global_hotkey` manager.
pub struct GlobalHotkeyBackend {
    manager: GlobalHotKeyManager,
    active: HashMap<u32, HotKey>,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self, RegisterError> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| RegisterError::Backend(e.to_string()))?;
        Ok(Self {
            manager,
            active: HashMap::new(),
        })
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&mut self, combo: &Combo) -> Result<u32, RegisterError> {
        let hotkey = HotKey::new(Some(os_modifiers(combo)), os_code(combo)?);
        let handle = hotkey.id();
        self.manager.register(hotkey).map_err(|e| match e {
            HotkeyError::AlreadyRegistered(hk) => RegisterError::Backend(format!(
                "already registered by another application (ID: {})",
                hk.id()
            )),
            HotkeyError::FailedToRegister(msg) => RegisterError::Backend(msg.to_string()),
            HotkeyError::OsError(os_err) => RegisterError::Backend(os_err.to_string()),
            other => RegisterError::Backend(other.to_string()),
        })?;
        self.active.insert(handle, hotkey);
        Ok(handle)
    }

    fn unregister(&mut self, handle: u32) -> Result<(), RegisterError> {
        if let Some(hotkey) = self.active.remove(&handle) {
            self.manager
                .unregister(hotkey)
                .map_err(|e| RegisterError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

fn os_modifiers(combo: &Combo) -> OsModifiers {
    let mut modifiers = OsModifiers::empty();
    if combo.modifiers.cmd {
        modifiers |= OsModifiers::META;
    }
    if combo.modifiers.ctrl {
        modifiers |= OsModifiers::CONTROL;
    }
    if combo.modifiers.alt {
        modifiers |= OsModifiers::ALT;
    }
    if combo.modifiers.shift {
        modifiers |= OsModifiers::SHIFT;
    }
    if combo.modifiers.caps {
        modifiers |= OsModifiers::CAPS_LOCK;
    }
    modifiers
}

fn os_code(combo: &Combo) -> Result<Code, RegisterError> {
    let code = match combo.key.as_str() {
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        "space" => Code::Space,
        "enter" => Code::Enter,
        "tab" => Code::Tab,
        "escape" => Code::Escape,
        "backspace" => Code::Backspace,
        "delete" => Code::Delete,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,
        "home" => Code::Home,
        "end" => Code::End,
        "pageup" => Code::PageUp,
        "pagedown" => Code::PageDown,
        "semicolon" => Code::Semicolon,
        "quote" => Code::Quote,
        "comma" => Code::Comma,
        "period" => Code::Period,
        "slash" => Code::Slash,
        "backslash" => Code::Backslash,
        "bracketleft" => Code::BracketLeft,
        "bracketright" => Code::BracketRight,
        "minus" => Code::Minus,
        "equal" => Code::Equal,
        "backquote" => Code::Backquote,
        other => {
            return Err(RegisterError::InvalidCombo(ComboParseError::UnknownKey(
                other.to_string(),
            )))
        }
    };
    Ok(code)
}

struct Registration {
    combo: Combo,
    handle: u32,
}

pub struct HotkeyRegistry {
    backend: Box<dyn HotkeyBackend>,
    gate: PermissionGate,
    next_id: RegistrationId,
    by_canonical: HashMap<String, RegistrationId>,
    registrations: HashMap<RegistrationId, Registration>,
    /// OS handle -> registration id, shared with the listener thread.
    by_handle: Arc<Mutex<HashMap<u32, RegistrationId>>>,
}

impl HotkeyRegistry {
    pub fn new(backend: Box<dyn HotkeyBackend>, gate: PermissionGate) -> Self {
        Self {
            backend,
            gate,
            next_id: 1,
            by_canonical: HashMap::new(),
            registrations: HashMap::new(),
            by_handle: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn combo_for(&self, id: RegistrationId) -> Option<&Combo> {
        self.registrations.get(&id).map(|r| &r.combo)
    }

    /// Register a combo. Re-registering the same canonical combo is an
    /// idempotent success returning the existing id.
    pub fn register(&mut self, combo: Combo) -> Result<RegistrationId, RegisterError> {
        if !self.gate.allows() {
            warn!(combo = %combo.canonical(), "Registration blocked, accessibility not granted");
            return Err(RegisterError::PermissionDenied);
        }
        if combo.is_reserved() {
            return Err(RegisterError::Reserved(combo.display_macos()));
        }
        let canonical = combo.canonical();
        if let Some(&existing) = self.by_canonical.get(&canonical) {
            debug!(combo = %canonical, id = existing, "Combo already registered");
            return Ok(existing);
        }
        let handle = self.backend.register(&combo)?;
        let id = self.next_id;
        self.next_id += 1;
        info!(combo = %canonical, id = id, handle = handle, "Registered global shortcut");
        self.by_canonical.insert(canonical, id);
        self.by_handle.lock().insert(handle, id);
        self.registrations.insert(id, Registration { combo, handle });
        Ok(id)
    }

    /// Release the registration for a canonical combo string. Returns
    /// false when no such registration exists.
    pub fn unregister(&mut self, canonical: &str) -> bool {
        let Some(id) = self.by_canonical.remove(canonical) else {
            return false;
        };
        if let Some(registration) = self.registrations.remove(&id) {
            self.by_handle.lock().remove(&registration.handle);
            if let Err(e) = self.backend.unregister(registration.handle) {
                warn!(combo = canonical, error = %e, "Backend failed to release shortcut");
            }
            info!(combo = canonical, id = id, "Unregistered global shortcut");
        }
        true
    }

    /// Release every registration, e.g. before re-registering the saved
    /// shortcut list.
    pub fn unregister_all(&mut self) {
        let canonicals: Vec<String> = self.by_canonical.keys().cloned().collect();
        for canonical in canonicals {
            self.unregister(&canonical);
        }
    }

    /// Shared handle-to-id map for the listener thread.
    pub fn resolver(&self) -> HotkeyResolver {
        HotkeyResolver {
            by_handle: self.by_handle.clone(),
        }
    }
}

/// Maps OS-delivered hotkey handles back to registration ids.
#[derive(Clone)]
pub struct HotkeyResolver {
    by_handle: Arc<Mutex<HashMap<u32, RegistrationId>>>,
}

impl HotkeyResolver {
    pub fn resolve(&self, handle: u32) -> Option<RegistrationId> {
        self.by_handle.lock().get(&handle).copied()
    }
}

/// Listen for OS hotkey presses and forward them as app events.
///
/// Presses for handles with no live registration are ignored.
pub fn spawn_hotkey_listener(resolver: HotkeyResolver, tx: Sender<AppEvent>) {
    std::thread::spawn(move || {
        info!("Hotkey listener started");
        let receiver = GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            match resolver.resolve(event.id) {
                Some(id) => {
                    debug!(id = id, handle = event.id, "Hotkey fired");
                    if tx.send_blocking(AppEvent::HotkeyFired(id)).is_err() {
                        break;
                    }
                }
                None => {
                    trace!(handle = event.id, "Ignoring press for unknown hotkey");
                }
            }
        }
        info!("Hotkey listener stopped");
    });
}
