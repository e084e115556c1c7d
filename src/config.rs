//! User settings persisted as a single JSON blob.
//!
//! Every field carries a serde default so settings written by older
//! versions keep loading; a malformed file falls back to defaults.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::hotkeys::permission::PermissionPolicy;
use crate::prefs::{PrefStore, SETTINGS_KEY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowSize {
    #[default]
    Small,
    Large,
}

impl WindowSize {
    /// Logical width/height of the popover window.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Small => (350, 600),
            Self::Large => (450, 750),
        }
    }
}

/// A user-saved shortcut: stable id plus canonical combo string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedShortcut {
    pub id: Uuid,
    pub combo: String,
}

impl SavedShortcut {
    pub fn new(combo: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            combo: combo.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub shortcuts: Vec<SavedShortcut>,
    pub theme: Theme,
    pub window_size: WindowSize,
    /// Run as a menu-bar accessory without a Dock icon.
    pub menu_bar_mode: bool,
    pub poll_interval_ms: u64,
    pub history_cap: usize,
    pub permission_policy: PermissionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shortcuts: Vec::new(),
            theme: Theme::default(),
            window_size: WindowSize::default(),
            menu_bar_mode: false,
            poll_interval_ms: 500,
            history_cap: crate::history::DEFAULT_CAP,
            permission_policy: PermissionPolicy::default(),
        }
    }
}

impl Settings {
    pub fn load(prefs: &PrefStore) -> Self {
        let settings: Settings = prefs.load(SETTINGS_KEY).unwrap_or_default();
        info!(
            shortcuts = settings.shortcuts.len(),
            poll_interval_ms = settings.poll_interval_ms,
            "Loaded settings"
        );
        settings
    }

    pub fn save(&self, prefs: &PrefStore) -> anyhow::Result<()> {
        prefs.save(SETTINGS_KEY, self)
    }

    pub fn has_shortcut(&self, combo: &str) -> bool {
        self.shortcuts.iter().any(|s| s.combo == combo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_when_nothing_is_saved() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&PrefStore::at(dir.path()));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval_ms, 500);
        assert_eq!(settings.history_cap, 100);
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempdir().unwrap();
        let prefs = PrefStore::at(dir.path());
        let mut settings = Settings::default();
        settings.theme = Theme::Dark;
        settings.window_size = WindowSize::Large;
        settings.shortcuts.push(SavedShortcut::new("cmd+shift+v"));
        settings.save(&prefs).unwrap();
        assert_eq!(Settings::load(&prefs), settings);
    }

    #[test]
    fn unknown_fields_do_not_break_loading() {
        let dir = tempdir().unwrap();
        let prefs = PrefStore::at(dir.path());
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"theme":"dark","some_future_field":42}"#,
        )
        .unwrap();
        let settings = Settings::load(&prefs);
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.history_cap, 100);
    }

    #[test]
    fn window_sizes_have_distinct_dimensions() {
        assert_eq!(WindowSize::Small.dimensions(), (350, 600));
        assert_eq!(WindowSize::Large.dimensions(), (450, 750));
    }

    #[test]
    fn has_shortcut_matches_combo_string() {
        let mut settings = Settings::default();
        settings.shortcuts.push(SavedShortcut::new("cmd+shift+v"));
        assert!(settings.has_shortcut("cmd+shift+v"));
        assert!(!settings.has_shortcut("cmd+shift+c"));
    }
}
