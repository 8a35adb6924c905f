//! Activation, deactivation and status checks against the licensing server

use std::sync::Arc;
use std::time::Duration;

use super::error::{ActivationError, DeactivationError, LicenseError};
use super::messages::{map_error_code, MessageContext};
use super::types::{mask_key, License, LicenseStatus};
use crate::guard::{Action, RequestGuard};
use crate::protocol::{
    license_request, ActivationReply, DeactivationReply, Operation, StatusReply,
};
use crate::store::StateStore;
use crate::transport::Transport;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Per-deployment constants the client sends with every request
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub product_id: String,
    /// Display name for messages; falls back to `product_id`
    pub product_name: String,
    pub site_url: String,
    pub timeout: Duration,
}

impl ClientSettings {
    pub fn new(product_id: impl Into<String>, site_url: impl Into<String>) -> Self {
        let product_id = product_id.into();
        Self {
            product_name: product_id.clone(),
            product_id,
            site_url: site_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Binds and unbinds the entitlement key for this site.
///
/// Every operation runs the request guard first; a rejected request never
/// reaches the network and never touches the store.
pub struct LicenseClient {
    store: Arc<dyn StateStore>,
    transport: Arc<dyn Transport>,
    guard: Arc<dyn RequestGuard>,
    settings: ClientSettings,
}

impl LicenseClient {
    pub fn new(
        store: Arc<dyn StateStore>,
        transport: Arc<dyn Transport>,
        guard: Arc<dyn RequestGuard>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            store,
            transport,
            guard,
            settings,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Current stored license. No network.
    pub fn current(&self) -> Result<License, LicenseError> {
        Ok(License::load(
            self.store.as_ref(),
            &self.settings.product_id,
            &self.settings.site_url,
        )?)
    }

    /// Activates `candidate_key` for this site.
    ///
    /// On success the key, `valid` status and expiry are persisted. A refusal
    /// for a key that was never bound persists nothing; a refusal for the
    /// already-bound key records the new negative status. Transport and
    /// protocol failures leave the store untouched.
    pub fn activate(&self, candidate_key: &str, token: &str) -> Result<License, ActivationError> {
        self.authorize(Action::Activate, token)?;

        let key = candidate_key.trim();
        if key.is_empty() {
            return Err(LicenseError::MissingKey);
        }

        let current = self.current()?;
        let rebinding = current.key == key && current.status != LicenseStatus::Unconfigured;

        let body = self.send(Operation::Activate, key)?;
        match ActivationReply::parse(&body)? {
            ActivationReply::Granted { expires } => {
                let mut license =
                    License::unconfigured(&self.settings.product_id, &self.settings.site_url);
                license.key = key.to_string();
                let license =
                    license.with_status(LicenseStatus::Valid, expires.and_then(|e| e.timestamp()));
                license.save(self.store.as_ref())?;
                tracing::info!(
                    key = %license.masked_key(),
                    expires_at = ?license.expires_at,
                    "license activated"
                );
                Ok(license)
            }
            ActivationReply::Denied {
                code,
                status,
                expires,
            } => {
                if rebinding {
                    current
                        .with_status(status, None)
                        .save_status(self.store.as_ref())?;
                }
                tracing::warn!(
                    key = %mask_key(key),
                    code = %code,
                    status = %status,
                    persisted = rebinding,
                    "license activation refused"
                );
                let expires_at = expires.and_then(|e| e.timestamp());
                let message = map_error_code(
                    &code,
                    &MessageContext {
                        expires_at,
                        product_name: &self.settings.product_name,
                    },
                );
                Err(LicenseError::Domain {
                    code,
                    status,
                    expires_at,
                    message,
                })
            }
        }
    }

    /// Deactivates the stored key for this site.
    ///
    /// Status and expiry are cleared, the key is kept so it can be
    /// reactivated without re-entry. Any failure leaves state unchanged.
    pub fn deactivate(&self, token: &str) -> Result<License, DeactivationError> {
        self.authorize(Action::Deactivate, token)?;

        let current = self.current()?;
        if !current.has_key() {
            return Err(LicenseError::MissingKey);
        }

        let body = self.send(Operation::Deactivate, &current.key)?;
        match DeactivationReply::parse(&body)? {
            DeactivationReply::Deactivated => {
                let license = current.with_status(LicenseStatus::Unconfigured, None);
                license.save_status(self.store.as_ref())?;
                tracing::info!(key = %license.masked_key(), "license deactivated");
                Ok(license)
            }
            DeactivationReply::Refused { code } => {
                tracing::warn!(key = %current.masked_key(), code = %code, "license deactivation refused");
                let message = map_error_code(
                    &code,
                    &MessageContext {
                        expires_at: None,
                        product_name: &self.settings.product_name,
                    },
                );
                Err(LicenseError::Domain {
                    code,
                    status: current.status,
                    expires_at: None,
                    message,
                })
            }
        }
    }

    /// Asks the server for the stored key's current status and records it.
    pub fn check(&self, token: &str) -> Result<License, LicenseError> {
        self.authorize(Action::Check, token)?;

        let current = self.current()?;
        if !current.has_key() {
            return Err(LicenseError::MissingKey);
        }

        let body = self.send(Operation::CheckLicense, &current.key)?;
        let reply = StatusReply::parse(&body)?;
        let license = current.with_status(reply.status, reply.expires.and_then(|e| e.timestamp()));
        license.save_status(self.store.as_ref())?;
        tracing::info!(
            key = %license.masked_key(),
            status = %license.status,
            "license status refreshed"
        );
        Ok(license)
    }

    fn authorize(&self, action: Action, token: &str) -> Result<(), LicenseError> {
        self.guard.authorize(action, token).map_err(|rejection| {
            tracing::debug!(%action, %rejection, "license request rejected before send");
            LicenseError::Unauthorized(rejection)
        })
    }

    fn send(&self, op: Operation, key: &str) -> Result<String, LicenseError> {
        let fields = license_request(op, key, &self.settings.product_id, &self.settings.site_url);
        self.transport
            .post_form(&fields, self.settings.timeout)
            .map_err(|e| {
                tracing::warn!(operation = %op, error = %e, "licensing server unreachable");
                LicenseError::Transport(e)
            })
    }
}
