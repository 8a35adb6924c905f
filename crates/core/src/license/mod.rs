//! License state and the clients that change it
//!
//! Handles key storage, activation and deactivation against the licensing
//! server, and rendering of outcomes for the operator. Status only ever
//! changes as the direct result of a server response.

pub mod client;
pub mod error;
pub mod messages;
pub mod types;

pub use client::{ClientSettings, LicenseClient};
pub use error::{ActivationError, DeactivationError, ErrorCategory, LicenseError};
pub use messages::{map_error, map_error_code, MessageContext, Severity, UserMessage};
pub use types::{License, LicenseStatus};
