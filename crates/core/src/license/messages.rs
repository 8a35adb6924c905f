//! Operator-facing messages for license outcomes
//!
//! Pure functions: no I/O, no state. Raw server text never passes through.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::protocol::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub severity: Severity,
    pub text: String,
}

impl UserMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Details from the response that some messages interpolate.
#[derive(Debug, Clone, Default)]
pub struct MessageContext<'a> {
    pub expires_at: Option<DateTime<Utc>>,
    pub product_name: &'a str,
}

pub const GENERIC_FAILURE: &str = "An error occurred, please try again.";

/// Maps a raw server error code to a message.
pub fn map_error(code: &str, ctx: &MessageContext<'_>) -> UserMessage {
    map_error_code(&ErrorCode::parse(code), ctx)
}

/// Maps a decoded error code to a message.
pub fn map_error_code(code: &ErrorCode, ctx: &MessageContext<'_>) -> UserMessage {
    let text = match code {
        ErrorCode::Expired => match ctx.expires_at {
            Some(at) => format!("Your license key expired on {}.", format_date(at)),
            None => "Your license key has expired.".to_string(),
        },
        ErrorCode::Disabled | ErrorCode::Revoked => {
            "Your license key has been disabled.".to_string()
        }
        ErrorCode::Missing => "Invalid license.".to_string(),
        ErrorCode::Invalid | ErrorCode::SiteInactive => {
            "Your license is not active for this URL.".to_string()
        }
        ErrorCode::ItemNameMismatch => {
            if ctx.product_name.is_empty() {
                "This appears to be an invalid license key for this product.".to_string()
            } else {
                format!(
                    "This appears to be an invalid license key for {}.",
                    ctx.product_name
                )
            }
        }
        ErrorCode::NoActivationsLeft => {
            "Your license key has reached its activation limit.".to_string()
        }
        ErrorCode::Unknown(_) => GENERIC_FAILURE.to_string(),
    };
    UserMessage::error(text)
}

/// Long-form date used in messages, e.g. `January 1, 2024`.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> MessageContext<'static> {
        MessageContext {
            expires_at: None,
            product_name: "Acme Forms",
        }
    }

    #[test]
    fn expired_mentions_date_when_known() {
        let ctx = MessageContext {
            expires_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            product_name: "",
        };
        let msg = map_error("expired", &ctx);
        assert_eq!(msg.text, "Your license key expired on January 1, 2024.");
        assert_eq!(msg.severity, Severity::Error);
    }

    #[test]
    fn expired_without_date() {
        assert_eq!(map_error("expired", &ctx()).text, "Your license key has expired.");
    }

    #[test]
    fn disabled_and_revoked_share_message() {
        assert_eq!(map_error("disabled", &ctx()), map_error("revoked", &ctx()));
    }

    #[test]
    fn site_inactive_mentions_url() {
        assert!(map_error("site_inactive", &ctx())
            .text
            .contains("not active for this URL"));
    }

    #[test]
    fn item_mismatch_names_product() {
        assert!(map_error("item_name_mismatch", &ctx()).text.contains("Acme Forms"));
    }

    #[test]
    fn unknown_code_never_echoes_server_text() {
        let msg = map_error("<script>alert(1)</script>", &ctx());
        assert_eq!(msg.text, GENERIC_FAILURE);
    }
}
