//! Global keyboard shortcuts: combo parsing, OS registration, and the
//! Accessibility permission gate.

pub mod combo;
pub mod permission;
pub mod registry;

pub use combo::{Combo, ComboParseError};
pub use permission::{PermissionGate, PermissionPolicy};
pub use registry::{HotkeyRegistry, RegisterError, RegistrationId};
