//! Deck configuration
//!
//! Board-agnostic configuration structures stored as postcard binary data,
//! and the manager that owns the live copy UI elements bind into.

pub mod lifecycle;
#[cfg(feature = "serde")]
pub mod persist;
pub mod runtime;
pub mod types;

pub use lifecycle::{ApplyReport, ButtonAddr, ConfigError, ConfigLifecycleManager};
pub use runtime::RuntimeConfig;
pub use types::*;
