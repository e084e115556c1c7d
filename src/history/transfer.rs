//! Plain-text export/import of the history.
//!
//! Entries are separated by a `---` line; favorites carry a literal
//! `[FAVORITE] ` prefix. Image entries are excluded from export and
//! cannot appear in imports.

use chrono::{Duration, Utc};
use tracing::info;

use crate::history::entry::{Entry, Payload};
use crate::history::store::HistoryStore;

pub const SEPARATOR: &str = "\n---\n";
pub const FAVORITE_MARKER: &str = "[FAVORITE] ";

impl HistoryStore {
    /// Serialize all text entries in display order.
    pub fn export_as_text(&self) -> String {
        self.view()
            .iter()
            .filter_map(|e| {
                let text = e.text()?.trim();
                if text.is_empty() {
                    return None;
                }
                if e.favorite {
                    Some(format!("{}{}", FAVORITE_MARKER, text))
                } else {
                    Some(text.to_string())
                }
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Parse exported text back into entries, skipping blanks and
    /// anything already in the store. Returns the number imported.
    pub fn import_from_text(&mut self, text: &str) -> usize {
        let now = Utc::now();
        let mut imported = 0usize;
        let mut next_rank = self.next_favorite_rank();
        for chunk in text.split(SEPARATOR) {
            let trimmed = chunk.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (favorite, content) = match trimmed.strip_prefix(FAVORITE_MARKER) {
                Some(rest) => (true, rest),
                None => (false, trimmed),
            };
            if self.contains_text(content) {
                continue;
            }
            let mut entry = Entry::new(Payload::text(content));
            if favorite {
                entry.favorite = true;
                entry.favorite_rank = Some(next_rank);
                next_rank += 1;
            } else {
                // Stagger timestamps so file order survives the recency sort.
                entry.touched_at = now - Duration::milliseconds(imported as i64);
            }
            self.push_entry(entry);
            imported += 1;
        }
        if imported > 0 {
            self.enforce_cap();
            self.persist();
        }
        info!(imported = imported, "Imported history entries");
        self.notify_import(imported);
        imported
    }

    fn notify_import(&self, imported: usize) {
        let message = if imported == 1 {
            "Imported 1 item".to_string()
        } else {
            format!("Imported {} items", imported)
        };
        self.notify(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::prefs::PrefStore;
    use tempfile::tempdir;

    fn test_store() -> (HistoryStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = HistoryStore::load(
            PrefStore::at(dir.path()),
            crate::history::store::DEFAULT_CAP,
            RecordingNotifier::new(),
        );
        (store, dir)
    }

    #[test]
    fn export_prefixes_favorites_and_joins_with_separator() {
        let (mut store, _dir) = test_store();
        store.insert(Payload::text("x"), true);
        store.insert(Payload::text("y"), false);
        assert_eq!(store.export_as_text(), "[FAVORITE] x\n---\ny");
    }

    #[test]
    fn export_skips_images() {
        let (mut store, _dir) = test_store();
        store.insert(Payload::text("a"), false);
        store.insert(Payload::image(vec![1, 2]), false);
        assert_eq!(store.export_as_text(), "a");
    }

    #[test]
    fn import_reconstructs_content_and_favorite_flags() {
        let (mut store, _dir) = test_store();
        let imported = store.import_from_text("[FAVORITE] x\n---\ny\n---\nz");
        assert_eq!(imported, 3);
        let view = store.view();
        assert_eq!(view[0].text(), Some("x"));
        assert!(view[0].favorite);
        assert_eq!(view[1].text(), Some("y"));
        assert_eq!(view[2].text(), Some("z"));
    }

    #[test]
    fn import_skips_blank_and_duplicate_chunks() {
        let (mut store, _dir) = test_store();
        store.insert(Payload::text("known"), false);
        let imported = store.import_from_text("known\n---\n   \n---\nfresh");
        assert_eq!(imported, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn import_assigns_ranks_above_existing_favorites() {
        let (mut store, _dir) = test_store();
        let a = store.insert(Payload::text("a"), true);
        store.import_from_text("[FAVORITE] b\n---\n[FAVORITE] c");
        assert_eq!(store.get(a).unwrap().favorite_rank, Some(0));
        let view = store.view();
        assert_eq!(view[1].text(), Some("b"));
        assert_eq!(view[1].favorite_rank, Some(1));
        assert_eq!(view[2].text(), Some("c"));
        assert_eq!(view[2].favorite_rank, Some(2));
    }

    #[test]
    fn export_trims_entries_and_drops_blank_ones() {
        let (mut store, _dir) = test_store();
        store.insert(Payload::text("  padded  "), false);
        store.insert(Payload::text("   "), false);
        assert_eq!(store.export_as_text(), "padded");
    }

    #[test]
    fn import_stays_within_the_history_cap() {
        let dir = tempdir().unwrap();
        let mut store =
            HistoryStore::load(PrefStore::at(dir.path()), 3, RecordingNotifier::new());
        store.insert(Payload::text("existing"), false);
        let chunks: Vec<String> = (0..10).map(|i| format!("item {}", i)).collect();
        store.import_from_text(&chunks.join("\n---\n"));
        assert!(store.len() <= 3);
        // The persisted blob is bounded too.
        let reloaded = HistoryStore::load(PrefStore::at(dir.path()), 3, RecordingNotifier::new());
        assert!(reloaded.len() <= 3);
    }

    #[test]
    fn imported_favorites_survive_cap_eviction() {
        let dir = tempdir().unwrap();
        let mut store =
            HistoryStore::load(PrefStore::at(dir.path()), 2, RecordingNotifier::new());
        store.import_from_text("[FAVORITE] a\n---\n[FAVORITE] b\n---\nc\n---\nd\n---\ne");
        assert_eq!(store.len(), 2);
        let view = store.view();
        assert!(view.iter().all(|e| e.favorite));
    }

    #[test]
    fn export_import_round_trip_preserves_text_entries() {
        let (mut source, _dir_a) = test_store();
        source.insert(Payload::text("fav one"), true);
        source.insert(Payload::text("plain one"), false);
        source.insert(Payload::text("plain two"), false);
        source.insert(Payload::image(vec![7]), false);
        let exported = source.export_as_text();

        let (mut target, _dir_b) = test_store();
        let imported = target.import_from_text(&exported);
        assert_eq!(imported, 3);
        let source_texts: Vec<(Option<String>, bool)> = source
            .view()
            .iter()
            .filter(|e| !e.payload.is_image())
            .map(|e| (e.text().map(String::from), e.favorite))
            .collect();
        let target_texts: Vec<(Option<String>, bool)> = target
            .view()
            .iter()
            .map(|e| (e.text().map(String::from), e.favorite))
            .collect();
        assert_eq!(source_texts, target_texts);
    }
}
