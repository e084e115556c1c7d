//! JSON preference files under the copydeck data directory.
//!
//! Each key maps to a single `<key>.json` file. Loads are forgiving:
//! a missing or malformed file yields `None` so the caller can fall
//! back to defaults instead of refusing to start.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Key for the persisted clipboard history.
pub const HISTORY_KEY: &str = "clipboard-history";
/// Key for user settings (shortcuts, theme, window size, ...).
pub const SETTINGS_KEY: &str = "settings";

/// File-backed preference store rooted at a directory.
#[derive(Debug, Clone)]
pub struct PrefStore {
    root: PathBuf,
}

impl PrefStore {
    /// Store rooted at `~/.copydeck` (temp dir if no home is available).
    pub fn open_default() -> Self {
        let root = dirs::home_dir()
            .map(|h| h.join(".copydeck"))
            .unwrap_or_else(|| std::env::temp_dir().join("copydeck"));
        Self { root }
    }

    /// Store rooted at an explicit directory. Used by tests.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Load and deserialize the value stored under `key`.
    ///
    /// Returns `None` when the file is missing or unreadable; a malformed
    /// file is logged and treated as absent.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key = key, "No saved value");
                return None;
            }
            Err(e) => {
                warn!(key = key, error = %e, path = %path.display(), "Failed to read preference file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key, error = %e, path = %path.display(), "Malformed preference file, ignoring");
                None
            }
        }
    }

    /// Serialize `value` and write it under `key`, creating the root
    /// directory if needed.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating preference dir {}", self.root.display()))?;
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(value).context("serializing preference value")?;
        fs::write(&path, json)
            .with_context(|| format!("writing preference file {}", path.display()))?;
        debug!(key = key, path = %path.display(), "Saved preference");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn missing_key_loads_none() {
        let dir = tempdir().unwrap();
        let prefs = PrefStore::at(dir.path());
        assert_eq!(prefs.load::<Sample>("nothing"), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let prefs = PrefStore::at(dir.path());
        let sample = Sample {
            name: "hello".into(),
            count: 3,
        };
        prefs.save("sample", &sample).unwrap();
        assert_eq!(prefs.load::<Sample>("sample"), Some(sample));
    }

    #[test]
    fn malformed_file_loads_none() {
        let dir = tempdir().unwrap();
        let prefs = PrefStore::at(dir.path());
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        assert_eq!(prefs.load::<Sample>("bad"), None);
    }

    #[test]
    fn save_creates_root_directory() {
        let dir = tempdir().unwrap();
        let prefs = PrefStore::at(dir.path().join("nested").join("deeper"));
        prefs
            .save("sample", &Sample { name: "x".into(), count: 1 })
            .unwrap();
        assert!(prefs.root().join("sample.json").exists());
    }
}
