//! Update checker with stale-while-revalidate caching

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::cache::{self, UpdateInfo, DEFAULT_TTL_SECS};
use crate::protocol::{version_request, ProtocolError, VersionReply};
use crate::store::{StateStore, LICENSE_KEY};
use crate::transport::{Transport, TransportError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct UpdateSettings {
    pub product_id: String,
    /// How long a successful check is served without asking again
    pub ttl: Duration,
    /// Kept short: checks run inline with whatever triggered them
    pub timeout: Duration,
}

impl UpdateSettings {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RefreshError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Answers "is there a newer version" without ever failing the caller.
pub struct UpdateChecker {
    store: Arc<dyn StateStore>,
    transport: Arc<dyn Transport>,
    settings: UpdateSettings,
}

impl UpdateChecker {
    pub fn new(
        store: Arc<dyn StateStore>,
        transport: Arc<dyn Transport>,
        settings: UpdateSettings,
    ) -> Self {
        Self {
            store,
            transport,
            settings,
        }
    }

    /// Returns version metadata for the product.
    ///
    /// Flow:
    /// 1. Cached entry younger than its TTL — return it, no network
    /// 2. Inside the back-off window of an earlier failure — return the cache as is
    /// 3. Ask the server — cache and return the fresh result
    /// 4. On transport or parse failure, return the previous entry unchanged
    ///    (or `None` if there never was one) and back off for one TTL
    pub fn check_for_update(&self, current_version: &str) -> Option<UpdateInfo> {
        let store = self.store.as_ref();
        let now = Utc::now();
        let cached = cache::load(store);

        if let Some(info) = &cached {
            if info.is_fresh(now) {
                tracing::debug!(checked_at = %info.checked_at, "update cache hit");
                return cached;
            }
        }

        if let Some(retry_after) = cache::retry_after(store) {
            if now < retry_after {
                tracing::debug!(%retry_after, "skipping version check after recent failure");
                return cached;
            }
        }

        match self.refresh(current_version, now) {
            Ok(info) => {
                if let Err(e) = cache::save(store, &info) {
                    tracing::warn!("could not write update cache: {e}");
                }
                if let Err(e) = cache::clear_retry_after(store) {
                    tracing::warn!("could not clear version-check back-off: {e}");
                }
                Some(info)
            }
            Err(e) => {
                tracing::warn!(
                    stale = cached.is_some(),
                    "version check failed, serving cached data: {e}"
                );
                match self.retry_at(now) {
                    Some(at) => {
                        if let Err(e) = cache::set_retry_after(store, at) {
                            tracing::warn!("could not record version-check back-off: {e}");
                        }
                    }
                    None => tracing::warn!(
                        ttl_secs = self.settings.ttl.as_secs(),
                        "update ttl out of range, not backing off"
                    ),
                }
                cached
            }
        }
    }

    /// Convenience for hosts: the cached or refreshed info, only if it offers
    /// a version newer than `current_version`.
    pub fn available_update(&self, current_version: &str) -> Option<UpdateInfo> {
        self.check_for_update(current_version)
            .filter(|info| info.update_available(current_version))
    }

    fn refresh(&self, current_version: &str, now: DateTime<Utc>) -> Result<UpdateInfo, RefreshError> {
        let key = self.stored_key();
        let fields = version_request(key.as_deref(), &self.settings.product_id, current_version);
        let body = self.transport.post_form(&fields, self.settings.timeout)?;
        let reply = VersionReply::parse(&body)?;

        Ok(UpdateInfo {
            checked_at: now,
            ttl: self.settings.ttl,
            latest_version: reply.latest_version,
            download_url: reply.download_url,
            changelog: reply.changelog,
        })
    }

    fn retry_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(self.settings.ttl).ok()?;
        now.checked_add_signed(ttl)
    }

    fn stored_key(&self) -> Option<String> {
        match self.store.get(LICENSE_KEY) {
            Ok(key) => key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            Err(e) => {
                tracing::warn!("could not read license key for version check: {e}");
                None
            }
        }
    }
}
