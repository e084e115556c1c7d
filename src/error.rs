use thiserror::Error;
use tracing::{error, warn};

use crate::hotkeys::combo::ComboParseError;
use crate::hotkeys::registry::RegisterError;

/// Domain-specific errors for copydeck
#[derive(Error, Debug)]
pub enum CopydeckError {
    #[error("Invalid shortcut: {0}")]
    ShortcutParse(#[from] ComboParseError),

    #[error("Shortcut registration failed: {0}")]
    ShortcutRegister(#[from] RegisterError),

    #[error("Failed to persist {what}: {source}")]
    Persist {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl CopydeckError {
    /// Short message suitable for a user-facing toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::ShortcutParse(e) => format!("Invalid shortcut: {}", e),
            Self::ShortcutRegister(e) => e.user_message(),
            Self::Persist { what, .. } => format!("Could not save {}", what),
        }
    }
}

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and user doesn't need to know.
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
