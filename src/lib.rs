//! copydeck: a clipboard-history utility core.
//!
//! Polls the system pasteboard into a bounded, deduped history with
//! favorites, search, and text import/export, summoned via global
//! keyboard shortcuts. The UI shell and window chrome live elsewhere;
//! this crate owns the state, persistence, and OS integration.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod hotkeys;
pub mod logging;
pub mod notify;
pub mod prefs;
