//! Anti-forgery and authorization checks in front of license actions

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

/// Actions that mutate license state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Activate,
    Deactivate,
    Check,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Activate => "activate",
            Action::Deactivate => "deactivate",
            Action::Check => "check",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardRejection {
    #[error("request token is missing or invalid")]
    BadToken,
    #[error("caller is not allowed to manage the license")]
    Forbidden,
}

/// Decides whether a request may proceed. Runs before any network call.
pub trait RequestGuard: Send + Sync {
    fn authorize(&self, action: Action, token: &str) -> Result<(), GuardRejection>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Viewer,
    Administrator,
}

/// Guard bound to one session secret.
///
/// Tokens are `hex(sha256(secret || action))`, so a token minted for
/// `deactivate` does not authorize `activate`.
pub struct SessionGuard {
    secret: [u8; 32],
    role: Role,
}

impl SessionGuard {
    /// Fresh session with a random secret
    pub fn new(role: Role) -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self { secret, role }
    }

    pub fn with_secret(secret: [u8; 32], role: Role) -> Self {
        Self { secret, role }
    }

    /// Token the UI layer embeds in the form for `action`
    pub fn issue(&self, action: Action) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update([0u8]);
        hasher.update(action.as_str().as_bytes());
        token_hex(&hasher.finalize())
    }
}

impl RequestGuard for SessionGuard {
    fn authorize(&self, action: Action, token: &str) -> Result<(), GuardRejection> {
        let expected = self.issue(action);
        if token.is_empty() || !constant_time_eq(expected.as_bytes(), token.as_bytes()) {
            return Err(GuardRejection::BadToken);
        }
        if self.role < Role::Administrator {
            return Err(GuardRejection::Forbidden);
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn token_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}
