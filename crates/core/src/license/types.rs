//! Core types for license state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::store::{StateStore, StoreError, LICENSE_EXPIRES_AT, LICENSE_KEY, LICENSE_STATUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    #[default]
    Unconfigured,
    Valid,
    Invalid,
    Inactive,
    Expired,
    Disabled,
    SiteInactive,
    ItemMismatch,
    NoActivationsLeft,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 9] = [
        LicenseStatus::Unconfigured,
        LicenseStatus::Valid,
        LicenseStatus::Invalid,
        LicenseStatus::Inactive,
        LicenseStatus::Expired,
        LicenseStatus::Disabled,
        LicenseStatus::SiteInactive,
        LicenseStatus::ItemMismatch,
        LicenseStatus::NoActivationsLeft,
    ];

    /// Storage and wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Unconfigured => "unconfigured",
            LicenseStatus::Valid => "valid",
            LicenseStatus::Invalid => "invalid",
            LicenseStatus::Inactive => "inactive",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Disabled => "disabled",
            LicenseStatus::SiteInactive => "site_inactive",
            LicenseStatus::ItemMismatch => "item_mismatch",
            LicenseStatus::NoActivationsLeft => "no_activations_left",
        }
    }

    pub fn is_valid(&self) -> bool {
        *self == LicenseStatus::Valid
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown license status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for LicenseStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LicenseStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Entitlement bound (or not yet bound) to this installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Opaque customer secret; empty means unconfigured
    pub key: String,
    pub status: LicenseStatus,
    /// Only ever set while `status` is `Valid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub product_id: String,
    pub site_url: String,
}

impl License {
    /// An unconfigured license for this deployment
    pub fn unconfigured(product_id: &str, site_url: &str) -> Self {
        Self {
            key: String::new(),
            status: LicenseStatus::Unconfigured,
            expires_at: None,
            product_id: product_id.to_string(),
            site_url: site_url.to_string(),
        }
    }

    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_valid()
    }

    /// First four characters of the key followed by an ellipsis, for logs and display.
    pub fn masked_key(&self) -> String {
        mask_key(&self.key)
    }

    /// Reads the license from the store.
    ///
    /// An unrecognized stored status loads as `Unconfigured`, and an expiry
    /// stored next to a non-valid status is dropped.
    pub fn load(
        store: &dyn StateStore,
        product_id: &str,
        site_url: &str,
    ) -> Result<License, StoreError> {
        let key = store
            .get(LICENSE_KEY)?
            .map(|k| k.trim().to_string())
            .unwrap_or_default();

        let status = match store.get(LICENSE_STATUS)? {
            Some(s) => s.parse().unwrap_or_else(|e: UnknownStatus| {
                tracing::warn!("ignoring stored license status: {e}");
                LicenseStatus::Unconfigured
            }),
            None => LicenseStatus::Unconfigured,
        };
        // A status without a key is meaningless
        let status = if key.is_empty() {
            LicenseStatus::Unconfigured
        } else {
            status
        };

        let expires_at = if status.is_valid() {
            store
                .get(LICENSE_EXPIRES_AT)?
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc))
        } else {
            None
        };

        Ok(License {
            key,
            status,
            expires_at,
            product_id: product_id.to_string(),
            site_url: site_url.to_string(),
        })
    }

    /// Writes key, status and expiry. `expires_at` is cleared unless `status` is valid.
    pub fn save(&self, store: &dyn StateStore) -> Result<(), StoreError> {
        if self.key.is_empty() {
            store.delete(LICENSE_KEY)?;
        } else {
            store.set(LICENSE_KEY, &self.key)?;
        }
        self.save_status(store)
    }

    /// Writes status and expiry only, leaving the stored key alone.
    pub(crate) fn save_status(&self, store: &dyn StateStore) -> Result<(), StoreError> {
        match self.status {
            LicenseStatus::Unconfigured => store.delete(LICENSE_STATUS)?,
            status => store.set(LICENSE_STATUS, status.as_str())?,
        }
        match (self.status.is_valid(), self.expires_at) {
            (true, Some(at)) => store.set(LICENSE_EXPIRES_AT, &at.to_rfc3339())?,
            _ => store.delete(LICENSE_EXPIRES_AT)?,
        }
        Ok(())
    }

    /// The operator edited the key.
    ///
    /// Persists the new key and drops status and expiry so the old binding is
    /// never attributed to it. Returns the reset license, or the current one
    /// unchanged if the key is the same.
    pub fn change_key(
        store: &dyn StateStore,
        product_id: &str,
        site_url: &str,
        new_key: &str,
    ) -> Result<License, StoreError> {
        let current = License::load(store, product_id, site_url)?;
        let new_key = new_key.trim();
        if current.key == new_key {
            return Ok(current);
        }

        let mut reset = License::unconfigured(product_id, site_url);
        reset.key = new_key.to_string();
        reset.save(store)?;
        tracing::info!(key = %reset.masked_key(), "license key changed, status reset");
        Ok(reset)
    }

    /// Forgets the license entirely (product removal).
    pub fn clear(store: &dyn StateStore) -> Result<(), StoreError> {
        store.delete(LICENSE_KEY)?;
        store.delete(LICENSE_STATUS)?;
        store.delete(LICENSE_EXPIRES_AT)?;
        Ok(())
    }

    /// Replaces status, clearing the expiry whenever the status leaves `Valid`.
    pub(crate) fn with_status(mut self, status: LicenseStatus, expires_at: Option<DateTime<Utc>>) -> Self {
        self.status = status;
        self.expires_at = if status.is_valid() { expires_at } else { None };
        self
    }
}

pub(crate) fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}\u{2026}")
}
