//! Cached version-check result, kept under `update.cache`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::version::is_newer;
use crate::store::{StateStore, StoreError, UPDATE_CACHE, UPDATE_RETRY_AFTER};

pub const DEFAULT_TTL_SECS: u64 = 12 * 60 * 60; // 12 hours
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Result of the last successful version check.
///
/// A stale entry is still served when a refresh fails; only a successful
/// refresh replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub checked_at: DateTime<Utc>,
    pub ttl: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
}

impl UpdateInfo {
    /// `now - checked_at < ttl`. A `checked_at` in the future counts as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.checked_at).to_std() {
            Ok(elapsed) => elapsed < self.ttl,
            Err(_) => false,
        }
    }

    /// Whether the server's latest version is strictly newer than `current_version`.
    pub fn update_available(&self, current_version: &str) -> bool {
        self.latest_version
            .as_deref()
            .is_some_and(|latest| is_newer(latest, current_version))
    }
}

/// Loads the cached entry regardless of age. A corrupt entry reads as absent.
pub fn load(store: &dyn StateStore) -> Option<UpdateInfo> {
    let raw = match store.get(UPDATE_CACHE) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!("could not read update cache: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::warn!("ignoring corrupt update cache: {e}");
            None
        }
    }
}

/// Replaces the cached entry.
pub fn save(store: &dyn StateStore, info: &UpdateInfo) -> Result<(), StoreError> {
    let json = serde_json::to_string(info).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    store.set(UPDATE_CACHE, &json)
}

/// Time before which no new version check should be sent after a failure.
pub fn retry_after(store: &dyn StateStore) -> Option<DateTime<Utc>> {
    store
        .get(UPDATE_RETRY_AFTER)
        .ok()
        .flatten()
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn set_retry_after(store: &dyn StateStore, at: DateTime<Utc>) -> Result<(), StoreError> {
    store.set(UPDATE_RETRY_AFTER, &at.to_rfc3339())
}

pub fn clear_retry_after(store: &dyn StateStore) -> Result<(), StoreError> {
    store.delete(UPDATE_RETRY_AFTER)
}
