//! Canonical identity of this installation, sent as `site_url`

use std::fmt::Write;

use reqwest::Url;
use sha2::{Digest, Sha256};

/// Returns the canonical site identifier for `product_id`.
///
/// A configured URL is normalized (lowercase scheme and host, no trailing
/// slash, no query or fragment). Without one, a `site://<16 hex>` identity
/// is derived from the product, the account and the machine, so two products
/// on one host never share an activation slot.
pub fn site_url(product_id: &str, configured: Option<&str>) -> String {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => canonicalize(url),
        None => derived_identity(product_id),
    }
}

/// Normalizes a site URL. Strings that don't parse as URLs are only trimmed
/// and stripped of trailing slashes.
pub fn canonicalize(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            // Url already lowercases scheme and host
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => raw.trim_end_matches('/').to_string(),
    }
}

fn derived_identity(product_id: &str) -> String {
    let account = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    let machine = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_default();
    let profile = dirs::config_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let digest = identity_digest(&[product_id.trim(), &account, &machine, &profile]);
    let mut id = String::with_capacity(7 + 16);
    id.push_str("site://");
    for byte in &digest[..8] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

// Length-prefixed so ("ab", "c") and ("a", "bc") hash differently.
fn identity_digest(parts: &[&str]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().into()
}
