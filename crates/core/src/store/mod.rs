//! State persistence boundary
//!
//! Provides a `StateStore` trait that decouples license and update-cache state
//! from wherever the host keeps it. Two implementations:
//! - `MemoryStore`: in-memory map (tests, embedding hosts with their own persistence)
//! - `FileStore`: a single JSON object on disk, one atomic rewrite per write

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Persisted entitlement key
pub const LICENSE_KEY: &str = "license.key";
/// Persisted license status (storage spelling of `LicenseStatus`)
pub const LICENSE_STATUS: &str = "license.status";
/// Persisted expiry, RFC 3339
pub const LICENSE_EXPIRES_AT: &str = "license.expires_at";
/// Serialized `UpdateInfo`
pub const UPDATE_CACHE: &str = "update.cache";
/// Earliest time the next version check may hit the network after a failure
pub const UPDATE_RETRY_AFTER: &str = "update.retry_after";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state store is corrupt: {0}")]
    Corrupt(String),
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Abstract key/value persistence.
///
/// Individual writes are atomic; nothing here spans multiple keys.
/// Returns owned values so callers don't hold locks.
pub trait StateStore: Send + Sync {
    /// Read a value, `None` if the key was never written or was deleted
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
