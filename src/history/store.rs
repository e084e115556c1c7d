//! Ordered clipboard history with dedup, favorites, and cap eviction.
//!
//! Display order is favorites first (by rank ascending), then everything
//! else by most-recently-touched. All mutations persist the full list as
//! one JSON blob; a failed save keeps the in-memory state and surfaces a
//! toast instead of failing the operation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::history::entry::{Entry, Payload};
use crate::notify::Notifier;
use crate::prefs::{PrefStore, HISTORY_KEY};

pub const DEFAULT_CAP: usize = 100;

/// Result of feeding a detected pasteboard change into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// New content, a fresh entry was created.
    Inserted(Uuid),
    /// Content already present as a non-favorite, its timestamp was refreshed.
    Bumped(Uuid),
    /// Content already present as a favorite, left untouched.
    Ignored,
}

pub struct HistoryStore {
    entries: Vec<Entry>,
    cap: usize,
    prefs: PrefStore,
    notifier: Arc<dyn Notifier>,
    /// Most recently copied entry, for UI highlight.
    selected: Option<Uuid>,
}

impl HistoryStore {
    /// Load persisted history, starting empty when nothing (or garbage)
    /// is on disk.
    pub fn load(prefs: PrefStore, cap: usize, notifier: Arc<dyn Notifier>) -> Self {
        let entries: Vec<Entry> = prefs.load(HISTORY_KEY).unwrap_or_default();
        info!(count = entries.len(), cap = cap, "Loaded clipboard history");
        let mut store = Self {
            entries,
            cap,
            prefs,
            notifier,
            selected: None,
        };
        store.enforce_cap();
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Entries in display order: favorites by rank, then recency.
    pub fn view(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by(|a, b| match (a.favorite, b.favorite) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (true, true) => a.favorite_rank.cmp(&b.favorite_rank),
            (false, false) => b.touched_at.cmp(&a.touched_at),
        });
        entries
    }

    /// Case-insensitive substring filter over the display order.
    ///
    /// Image entries never match a non-empty query. An empty query
    /// returns the full view.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let needle = query.to_lowercase();
        self.view()
            .into_iter()
            .filter(|e| {
                if needle.is_empty() {
                    return true;
                }
                !e.payload.is_image() && e.normalized.contains(&needle)
            })
            .collect()
    }

    /// Handle a detected pasteboard change.
    ///
    /// Identical content already in the store collapses to the existing
    /// entry: non-favorites get a recency bump, favorites are never
    /// touched by this path.
    pub fn record_from_clipboard(&mut self, payload: Payload) -> RecordOutcome {
        let fingerprint = payload.fingerprint();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.fingerprint() == fingerprint)
        {
            if existing.favorite {
                debug!(id = %existing.id, "Clipboard content matches favorite, ignoring");
                return RecordOutcome::Ignored;
            }
            existing.touched_at = Utc::now();
            let id = existing.id;
            debug!(id = %id, "Clipboard content already known, bumped to most recent");
            self.persist();
            return RecordOutcome::Bumped(id);
        }

        let entry = Entry::new(payload);
        let id = entry.id;
        info!(id = %id, image = entry.payload.is_image(), "Captured clipboard entry");
        self.entries.push(entry);
        self.enforce_cap();
        self.persist();
        RecordOutcome::Inserted(id)
    }

    /// Unconditionally create a new entry, e.g. from the manual-add form.
    pub fn insert(&mut self, payload: Payload, favorite: bool) -> Uuid {
        let mut entry = Entry::new(payload);
        if favorite {
            entry.favorite = true;
            entry.favorite_rank = Some(self.next_favorite_rank());
        }
        let id = entry.id;
        info!(id = %id, favorite = favorite, "Inserted entry");
        self.entries.push(entry);
        self.enforce_cap();
        self.persist();
        self.notifier.notify("Added");
        id
    }

    /// Mark an entry as copied: highlight it and, for non-favorites,
    /// bump it to most recent. Returns the payload to put on the
    /// pasteboard.
    pub fn mark_copied(&mut self, id: Uuid) -> Option<Payload> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        if !entry.favorite {
            entry.touched_at = Utc::now();
        }
        let payload = entry.payload.clone();
        self.selected = Some(id);
        debug!(id = %id, "Entry copied");
        self.persist();
        Some(payload)
    }

    pub fn toggle_favorite(&mut self, id: Uuid) -> bool {
        let next_rank = self.next_favorite_rank();
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if entry.favorite {
            entry.favorite = false;
            entry.favorite_rank = None;
            debug!(id = %id, "Unfavorited entry");
        } else {
            entry.favorite = true;
            entry.favorite_rank = Some(next_rank);
            debug!(id = %id, rank = next_rank, "Favorited entry");
        }
        self.persist();
        true
    }

    pub fn move_favorite_up(&mut self, id: Uuid) -> bool {
        self.move_favorite(id, -1)
    }

    pub fn move_favorite_down(&mut self, id: Uuid) -> bool {
        self.move_favorite(id, 1)
    }

    /// Swap with the adjacent favorite and renumber ranks 0..N-1.
    fn move_favorite(&mut self, id: Uuid, direction: i32) -> bool {
        let mut favorites: Vec<Uuid> = self
            .view()
            .iter()
            .filter(|e| e.favorite)
            .map(|e| e.id)
            .collect();
        let Some(pos) = favorites.iter().position(|&f| f == id) else {
            return false;
        };
        let target = pos as i32 + direction;
        if target < 0 || target as usize >= favorites.len() {
            return false;
        }
        favorites.swap(pos, target as usize);
        for (rank, fav_id) in favorites.iter().enumerate() {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == *fav_id) {
                entry.favorite_rank = Some(rank as u32);
            }
        }
        self.persist();
        true
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return false;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        info!(id = %id, "Deleted entry");
        self.persist();
        true
    }

    /// Remove every non-favorite entry. Favorites and their ranks are
    /// untouched.
    pub fn clear_non_favorites(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.favorite);
        let removed = before - self.entries.len();
        if removed > 0 {
            info!(removed = removed, "Cleared non-favorite history");
            self.persist();
        }
        removed
    }

    pub(crate) fn next_favorite_rank(&self) -> u32 {
        self.entries
            .iter()
            .filter_map(|e| e.favorite_rank)
            .max()
            .map(|r| r + 1)
            .unwrap_or(0)
    }

    pub(crate) fn contains_text(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e.text() == Some(text))
    }

    pub(crate) fn push_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub(crate) fn notify(&self, message: &str) {
        self.notifier.notify(message);
    }

    /// Evict oldest non-favorites while over the cap. Favorites are
    /// never evicted, so an all-favorite store may exceed the cap.
    pub(crate) fn enforce_cap(&mut self) {
        while self.entries.len() > self.cap {
            let oldest = self
                .entries
                .iter()
                .filter(|e| !e.favorite)
                .min_by_key(|e| e.touched_at)
                .map(|e| e.id);
            match oldest {
                Some(id) => {
                    debug!(id = %id, "Evicting oldest entry over cap");
                    self.entries.retain(|e| e.id != id);
                }
                None => break,
            }
        }
    }

    pub(crate) fn persist(&self) {
        if let Err(e) = self.prefs.save(HISTORY_KEY, &self.entries) {
            warn!(error = %e, "Failed to persist clipboard history");
            self.notifier.notify("Could not save history");
        }
    }
}
