//! Clipboard history: entries, the ordered store, and text import/export.

pub mod entry;
pub mod store;
pub mod transfer;

pub use entry::{Entry, Payload};
pub use store::{HistoryStore, RecordOutcome, DEFAULT_CAP};
