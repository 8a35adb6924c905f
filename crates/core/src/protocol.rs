//! Wire protocol spoken with the licensing server
//!
//! Requests are flat form-field lists; responses are JSON objects decoded
//! into typed replies. Anything the server says that we don't recognize ends
//! up in an explicit fallthrough variant instead of reaching the user.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fmt;

use crate::license::types::LicenseStatus;

/// Remote operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Activate,
    Deactivate,
    CheckLicense,
    GetVersion,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Activate => "activate",
            Operation::Deactivate => "deactivate",
            Operation::CheckLicense => "check_license",
            Operation::GetVersion => "get_version",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form fields for one request, in send order
pub type FormFields = Vec<(&'static str, String)>;

/// Fields for `activate`, `deactivate` and `check_license`.
pub fn license_request(op: Operation, key: &str, product_id: &str, site_url: &str) -> FormFields {
    vec![
        ("operation", op.as_str().to_string()),
        ("license", key.to_string()),
        ("product_id", product_id.to_string()),
        ("site_url", site_url.to_string()),
    ]
}

/// Fields for `get_version`. The key is optional; an unlicensed install still
/// learns that a new version exists.
pub fn version_request(key: Option<&str>, product_id: &str, current_version: &str) -> FormFields {
    let mut fields = vec![("operation", Operation::GetVersion.as_str().to_string())];
    if let Some(key) = key.filter(|k| !k.is_empty()) {
        fields.push(("license", key.to_string()));
    }
    fields.push(("product_id", product_id.to_string()));
    fields.push(("version", current_version.to_string()));
    fields
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("unrecognized expiry date: {0}")]
    BadExpiry(String),
}

/// Domain error codes reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Expired,
    Disabled,
    Revoked,
    Missing,
    Invalid,
    SiteInactive,
    ItemNameMismatch,
    NoActivationsLeft,
    /// Anything else. The raw code is kept for logs, never for display.
    Unknown(String),
}

impl ErrorCode {
    pub fn parse(code: &str) -> ErrorCode {
        match code.trim() {
            "expired" => ErrorCode::Expired,
            "disabled" => ErrorCode::Disabled,
            "revoked" => ErrorCode::Revoked,
            "missing" => ErrorCode::Missing,
            "invalid" => ErrorCode::Invalid,
            "site_inactive" => ErrorCode::SiteInactive,
            "item_name_mismatch" => ErrorCode::ItemNameMismatch,
            "no_activations_left" => ErrorCode::NoActivationsLeft,
            other => ErrorCode::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::Expired => "expired",
            ErrorCode::Disabled => "disabled",
            ErrorCode::Revoked => "revoked",
            ErrorCode::Missing => "missing",
            ErrorCode::Invalid => "invalid",
            ErrorCode::SiteInactive => "site_inactive",
            ErrorCode::ItemNameMismatch => "item_name_mismatch",
            ErrorCode::NoActivationsLeft => "no_activations_left",
            ErrorCode::Unknown(raw) => raw,
        }
    }

    /// License status this failure puts the entitlement in.
    ///
    /// Unrecognized codes fall back to the `license` field of the response
    /// when that names a known status, otherwise `Invalid`.
    pub fn status(&self, reported: Option<LicenseStatus>) -> LicenseStatus {
        match self {
            ErrorCode::Expired => LicenseStatus::Expired,
            ErrorCode::Disabled | ErrorCode::Revoked => LicenseStatus::Disabled,
            ErrorCode::Missing | ErrorCode::Invalid => LicenseStatus::Invalid,
            ErrorCode::SiteInactive => LicenseStatus::SiteInactive,
            ErrorCode::ItemNameMismatch => LicenseStatus::ItemMismatch,
            ErrorCode::NoActivationsLeft => LicenseStatus::NoActivationsLeft,
            ErrorCode::Unknown(_) => match reported {
                Some(LicenseStatus::Valid) | Some(LicenseStatus::Unconfigured) | None => {
                    LicenseStatus::Invalid
                }
                Some(status) => status,
            },
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expiry as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(DateTime<Utc>),
    /// Key never expires
    Lifetime,
}

impl Expiry {
    /// Accepts `lifetime`, RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
    /// (taken as UTC) and bare `YYYY-MM-DD` (midnight UTC).
    pub fn parse(raw: &str) -> Result<Expiry, ProtocolError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("lifetime") {
            return Ok(Expiry::Lifetime);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Expiry::At(dt.with_timezone(&Utc)));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Ok(Expiry::At(naive.and_utc()));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Expiry::At(naive.and_utc()));
            }
        }
        Err(ProtocolError::BadExpiry(raw.to_string()))
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::At(at) => Some(*at),
            Expiry::Lifetime => None,
        }
    }
}

// ── Raw response shapes ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LicenseResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub expires: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VersionResponse {
    #[serde(default)]
    pub new_version: Option<serde_json::Value>,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub sections: Option<VersionSections>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VersionSections {
    #[serde(default)]
    pub changelog: Option<String>,
}

fn parse_object<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ProtocolError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(ProtocolError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}

fn parse_expires(value: Option<&serde_json::Value>) -> Result<Option<Expiry>, ProtocolError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Bool(false)) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Expiry::parse(s).map(Some),
        Some(other) => Err(ProtocolError::BadExpiry(other.to_string())),
    }
}

/// Expiry on replies that don't grant anything: a date we can't read is
/// dropped rather than failing the whole reply.
fn parse_expires_lenient(value: Option<&serde_json::Value>) -> Option<Expiry> {
    parse_expires(value).unwrap_or_else(|e| {
        tracing::warn!("ignoring unreadable expiry in license reply: {e}");
        None
    })
}

fn reported_status(license: Option<&str>) -> Option<LicenseStatus> {
    license.and_then(|s| s.parse().ok())
}

// ── Typed replies ────────────────────────────────────────────────

/// Outcome of `activate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationReply {
    Granted {
        expires: Option<Expiry>,
    },
    Denied {
        code: ErrorCode,
        status: LicenseStatus,
        expires: Option<Expiry>,
    },
}

impl ActivationReply {
    pub fn parse(body: &str) -> Result<ActivationReply, ProtocolError> {
        let raw: LicenseResponse = parse_object(body)?;
        let reported = reported_status(raw.license.as_deref());

        if raw.success && reported == Some(LicenseStatus::Valid) {
            let expires = parse_expires(raw.expires.as_ref())?;
            return Ok(ActivationReply::Granted { expires });
        }

        let expires = parse_expires_lenient(raw.expires.as_ref());
        let code = match raw.error.as_deref() {
            Some(code) if !code.trim().is_empty() => ErrorCode::parse(code),
            _ => ErrorCode::parse(raw.license.as_deref().unwrap_or_default()),
        };
        let status = code.status(reported);
        Ok(ActivationReply::Denied {
            code,
            status,
            expires,
        })
    }
}

/// Outcome of `deactivate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeactivationReply {
    Deactivated,
    Refused { code: ErrorCode },
}

impl DeactivationReply {
    pub fn parse(body: &str) -> Result<DeactivationReply, ProtocolError> {
        let raw: LicenseResponse = parse_object(body)?;
        if raw.success && raw.license.as_deref() == Some("deactivated") {
            return Ok(DeactivationReply::Deactivated);
        }
        let code = match raw.error.as_deref() {
            Some(code) if !code.trim().is_empty() => ErrorCode::parse(code),
            _ => ErrorCode::parse(raw.license.as_deref().unwrap_or("failed")),
        };
        Ok(DeactivationReply::Refused { code })
    }
}

/// Outcome of `check_license`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReply {
    pub status: LicenseStatus,
    pub expires: Option<Expiry>,
}

impl StatusReply {
    pub fn parse(body: &str) -> Result<StatusReply, ProtocolError> {
        let raw: LicenseResponse = parse_object(body)?;
        let expires = parse_expires_lenient(raw.expires.as_ref());
        let status = match raw.license.as_deref() {
            Some(s) => s.parse().unwrap_or_else(|_| {
                raw.error
                    .as_deref()
                    .map(|c| ErrorCode::parse(c).status(None))
                    .unwrap_or(LicenseStatus::Invalid)
            }),
            None => LicenseStatus::Invalid,
        };
        Ok(StatusReply { status, expires })
    }
}

/// Outcome of `get_version`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionReply {
    pub latest_version: Option<String>,
    pub download_url: Option<String>,
    pub changelog: Option<String>,
}

impl VersionReply {
    pub fn parse(body: &str) -> Result<VersionReply, ProtocolError> {
        let raw: VersionResponse = parse_object(body)?;
        let latest_version = match raw.new_version {
            Some(serde_json::Value::String(s)) => non_empty(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let changelog = raw
            .changelog
            .or_else(|| raw.sections.and_then(|s| s.changelog));
        Ok(VersionReply {
            latest_version,
            download_url: raw.download_link.or(raw.package).and_then(non_empty),
            changelog: changelog.and_then(non_empty),
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
