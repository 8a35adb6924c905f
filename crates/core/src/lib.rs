//! Keyward Core - site license client
//!
//! This crate binds a customer's entitlement key to one installation and
//! keeps track of available updates:
//! - Activation, deactivation and status checks against a licensing server
//! - Typed wire protocol with an explicit fallthrough for unknown error codes
//! - Operator-facing messages that never echo raw server text
//! - TTL-cached version checks that fall back to stale data on failure
//!
//! Persistence, transport and request authorization are injected through the
//! `StateStore`, `Transport` and `RequestGuard` traits.

pub mod config;
pub mod guard;
pub mod license;
pub mod protocol;
pub mod site;
pub mod store;
pub mod transport;
pub mod update;

pub use config::{ConfigError, KeywardConfig};
pub use guard::{Action, GuardRejection, RequestGuard, Role, SessionGuard};
pub use license::{
    map_error, ActivationError, ClientSettings, DeactivationError, ErrorCategory, License,
    LicenseClient, LicenseError, LicenseStatus, UserMessage,
};
pub use protocol::ErrorCode;
pub use store::{FileStore, MemoryStore, StateStore, StoreError};
pub use transport::{HttpTransport, Transport, TransportError};
pub use update::{UpdateChecker, UpdateInfo, UpdateSettings};

/// Keyward version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
