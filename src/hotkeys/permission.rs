//! Accessibility permission gate for global shortcut registration.
//!
//! The OS does not push permission changes, so when the gate is active a
//! watcher thread polls the trusted state and logs transitions. The gate
//! itself is policy-driven: `Bypass` registers unconditionally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionPolicy {
    /// Registration requires the Accessibility permission.
    Required,
    /// Register unconditionally.
    #[default]
    Bypass,
}

pub trait AccessibilityCheck: Send + Sync {
    fn is_trusted(&self) -> bool;
}

/// Queries the real OS trust state. Always trusted off macOS.
pub struct SystemAccessibility;

impl AccessibilityCheck for SystemAccessibility {
    #[cfg(target_os = "macos")]
    fn is_trusted(&self) -> bool {
        macos_accessibility_client::accessibility::application_is_trusted()
    }

    #[cfg(not(target_os = "macos"))]
    fn is_trusted(&self) -> bool {
        true
    }
}

#[derive(Clone)]
pub struct PermissionGate {
    policy: PermissionPolicy,
    check: Arc<dyn AccessibilityCheck>,
}

impl PermissionGate {
    pub fn new(policy: PermissionPolicy, check: Arc<dyn AccessibilityCheck>) -> Self {
        Self { policy, check }
    }

    pub fn bypass() -> Self {
        Self::new(PermissionPolicy::Bypass, Arc::new(SystemAccessibility))
    }

    pub fn policy(&self) -> PermissionPolicy {
        self.policy
    }

    /// Whether shortcut registration may proceed right now.
    pub fn allows(&self) -> bool {
        match self.policy {
            PermissionPolicy::Bypass => true,
            PermissionPolicy::Required => self.check.is_trusted(),
        }
    }

    /// Guidance shown when registration is blocked by the gate.
    pub fn guidance(&self) -> &'static str {
        "Grant Accessibility access in System Settings > Privacy & Security > Accessibility"
    }
}

/// Polls the trusted state on an interval, exposing the latest value as
/// a shared flag for the UI.
pub struct PermissionWatcher {
    trusted: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

impl PermissionWatcher {
    pub fn spawn(check: Arc<dyn AccessibilityCheck>, interval: Duration) -> Self {
        let trusted = Arc::new(AtomicBool::new(check.is_trusted()));
        let stop = Arc::new(AtomicBool::new(false));
        let watcher = Self {
            trusted: trusted.clone(),
            stop: stop.clone(),
        };
        std::thread::spawn(move || {
            info!(interval_ms = interval.as_millis() as u64, "Permission watcher started");
            while !stop.load(Ordering::Relaxed) {
                let now = check.is_trusted();
                let was = trusted.swap(now, Ordering::Relaxed);
                if now != was {
                    if now {
                        info!("Accessibility permission granted");
                    } else {
                        warn!("Accessibility permission revoked");
                    }
                }
                std::thread::sleep(interval);
            }
            debug!("Permission watcher stopped");
        });
        watcher
    }

    pub fn trusted_flag(&self) -> Arc<AtomicBool> {
        self.trusted.clone()
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for PermissionWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
