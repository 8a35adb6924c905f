//! Error types for license operations

use chrono::{DateTime, Utc};

use super::messages::{UserMessage, GENERIC_FAILURE};
use super::types::LicenseStatus;
use crate::guard::GuardRejection;
use crate::protocol::{ErrorCode, ProtocolError};
use crate::store::StoreError;
use crate::transport::TransportError;

/// Which class of failure an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected locally before any network call
    Validation,
    Transport,
    /// Server answered with something we could not decode
    Protocol,
    /// Well-formed business-rule failure from the server
    Domain,
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum LicenseError {
    #[error("request rejected: {0}")]
    Unauthorized(GuardRejection),

    #[error("no license key provided")]
    MissingKey,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unreadable response from licensing server: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{message}")]
    Domain {
        code: ErrorCode,
        status: LicenseStatus,
        expires_at: Option<DateTime<Utc>>,
        message: UserMessage,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ActivationError = LicenseError;
pub type DeactivationError = LicenseError;

impl LicenseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LicenseError::Unauthorized(_) | LicenseError::MissingKey => ErrorCategory::Validation,
            LicenseError::Transport(_) => ErrorCategory::Transport,
            LicenseError::Protocol(_) => ErrorCategory::Protocol,
            LicenseError::Domain { .. } => ErrorCategory::Domain,
            LicenseError::Store(_) => ErrorCategory::Storage,
        }
    }

    /// Transport, protocol and storage failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Protocol | ErrorCategory::Storage
        )
    }

    /// Message safe to show the operator.
    pub fn user_message(&self) -> UserMessage {
        match self {
            LicenseError::Unauthorized(GuardRejection::BadToken) => UserMessage::error(
                "Your request could not be verified. Reload the page and try again.",
            ),
            LicenseError::Unauthorized(GuardRejection::Forbidden) => {
                UserMessage::error("You do not have permission to manage the license.")
            }
            LicenseError::MissingKey => UserMessage::error("Enter a license key first."),
            LicenseError::Transport(_) | LicenseError::Protocol(_) => UserMessage::error(
                "Could not reach the licensing server. Please try again later.",
            ),
            LicenseError::Domain { message, .. } => message.clone(),
            LicenseError::Store(_) => UserMessage::error(GENERIC_FAILURE),
        }
    }
}
