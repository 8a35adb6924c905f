mod common;

use chrono::Utc;
use common::{field, ScriptedTransport, PRODUCT_ID};
use keyward_core::store::{LICENSE_KEY, UPDATE_CACHE};
use keyward_core::update::cache;
use keyward_core::{
    MemoryStore, StateStore, TransportError, UpdateChecker, UpdateInfo, UpdateSettings,
};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(12 * 60 * 60);

fn checker() -> (Arc<MemoryStore>, Arc<ScriptedTransport>, UpdateChecker) {
    let store = Arc::new(MemoryStore::new());
    let transport = ScriptedTransport::new();
    let mut settings = UpdateSettings::new(PRODUCT_ID);
    settings.ttl = TTL;
    let checker = UpdateChecker::new(store.clone(), transport.clone(), settings);
    (store, transport, checker)
}

fn cached_entry(age: chrono::Duration, latest: &str) -> UpdateInfo {
    UpdateInfo {
        checked_at: Utc::now() - age,
        ttl: TTL,
        latest_version: Some(latest.to_string()),
        download_url: Some("https://downloads.example.com/acme-1.2.0.zip".to_string()),
        changelog: None,
    }
}

const VERSION_BODY: &str = r#"{
    "new_version": "1.2.0",
    "download_link": "https://downloads.example.com/acme-1.2.0.zip",
    "sections": {"changelog": "<h4>1.2.0</h4><ul><li>Faster exports</li></ul>"}
}"#;

#[test]
fn repeated_checks_within_ttl_hit_network_once() {
    let (_store, transport, checker) = checker();
    transport.reply(VERSION_BODY);

    let results: Vec<_> = (0..10).map(|_| checker.check_for_update("1.1.0")).collect();

    assert_eq!(transport.calls(), 1);
    let first = results[0].clone().expect("first check should succeed");
    assert!(results.iter().all(|r| r.as_ref() == Some(&first)));
    assert_eq!(first.latest_version.as_deref(), Some("1.2.0"));
    assert!(first.changelog.as_deref().unwrap().contains("Faster exports"));
    assert!(first.update_available("1.1.0"));
}

#[test]
fn fresh_cache_skips_network() {
    let (store, transport, checker) = checker();
    cache::save(store.as_ref(), &cached_entry(chrono::Duration::minutes(5), "1.3.0")).unwrap();

    let info = checker.check_for_update("1.1.0").unwrap();

    assert_eq!(transport.calls(), 0);
    assert_eq!(info.latest_version.as_deref(), Some("1.3.0"));
}

#[test]
fn expired_cache_and_unreachable_server_serves_stale_entry() {
    let (store, transport, checker) = checker();
    let stale = cached_entry(chrono::Duration::hours(13), "1.2.0");
    cache::save(store.as_ref(), &stale).unwrap();
    transport.fail(TransportError::Connect("connection refused".to_string()));

    let info = checker.check_for_update("1.1.0");

    assert_eq!(transport.calls(), 1);
    assert_eq!(info, Some(stale.clone()));
    assert_eq!(cache::load(store.as_ref()), Some(stale));
}

#[test]
fn timeout_serves_stale_entry_unchanged() {
    let (store, transport, checker) = checker();
    let stale = cached_entry(chrono::Duration::hours(20), "1.2.0");
    cache::save(store.as_ref(), &stale).unwrap();
    transport.fail(TransportError::Timeout(Duration::from_secs(5)));

    assert_eq!(checker.check_for_update("1.1.0"), Some(stale));
}

#[test]
fn failure_without_cache_returns_none() {
    let (store, transport, checker) = checker();
    transport.fail(TransportError::Timeout(Duration::from_secs(5)));

    assert_eq!(checker.check_for_update("1.1.0"), None);
    assert_eq!(store.get(UPDATE_CACHE).unwrap(), None);
}

#[test]
fn unparseable_reply_serves_stale_entry() {
    let (store, transport, checker) = checker();
    let stale = cached_entry(chrono::Duration::hours(13), "1.2.0");
    cache::save(store.as_ref(), &stale).unwrap();
    transport.reply("Service Unavailable");

    assert_eq!(checker.check_for_update("1.1.0"), Some(stale));
}

#[test]
fn failure_backs_off_until_next_ttl_window() {
    let (_store, transport, checker) = checker();
    transport.fail(TransportError::Timeout(Duration::from_secs(5)));
    transport.reply(VERSION_BODY);

    assert_eq!(checker.check_for_update("1.1.0"), None);
    assert_eq!(checker.check_for_update("1.1.0"), None);
    assert_eq!(checker.check_for_update("1.1.0"), None);

    assert_eq!(transport.calls(), 1);
}

#[test]
fn failure_with_out_of_range_ttl_serves_cache_without_back_off() {
    let store = Arc::new(MemoryStore::new());
    let transport = ScriptedTransport::new();
    let mut settings = UpdateSettings::new(PRODUCT_ID);
    settings.ttl = Duration::from_secs(10_000_000_000_000);
    let checker = UpdateChecker::new(store.clone(), transport.clone(), settings);
    transport.fail(TransportError::Connect("connection refused".to_string()));

    assert_eq!(checker.check_for_update("1.0.0"), None);
    assert_eq!(transport.calls(), 1);
    assert_eq!(cache::retry_after(store.as_ref()), None);
}

#[test]
fn stale_cache_is_replaced_on_success() {
    let (store, transport, checker) = checker();
    cache::save(store.as_ref(), &cached_entry(chrono::Duration::hours(13), "1.1.5")).unwrap();
    transport.reply(VERSION_BODY);

    let info = checker.check_for_update("1.1.0").unwrap();

    assert_eq!(info.latest_version.as_deref(), Some("1.2.0"));
    assert!(info.is_fresh(Utc::now()));
    assert_eq!(cache::load(store.as_ref()), Some(info));
}

#[test]
fn request_includes_stored_key_and_short_timeout() {
    let (store, transport, checker) = checker();
    store.set(LICENSE_KEY, "ABC123").unwrap();
    transport.reply(VERSION_BODY);

    checker.check_for_update("1.1.0");

    let req = transport.last_request();
    assert_eq!(field(&req, "operation").as_deref(), Some("get_version"));
    assert_eq!(field(&req, "license").as_deref(), Some("ABC123"));
    assert_eq!(field(&req, "product_id").as_deref(), Some(PRODUCT_ID));
    assert_eq!(transport.last_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn unlicensed_install_still_checks_without_key() {
    let (_store, transport, checker) = checker();
    transport.reply(VERSION_BODY);

    assert!(checker.check_for_update("1.1.0").is_some());
    assert_eq!(field(&transport.last_request(), "license"), None);
}

#[test]
fn equal_or_older_remote_version_is_not_available() {
    let (_store, transport, checker) = checker();
    transport.reply(r#"{"new_version": "1.1.0", "package": "https://downloads.example.com/a.zip"}"#);

    let info = checker.check_for_update("1.1.0").unwrap();
    assert_eq!(
        info.download_url.as_deref(),
        Some("https://downloads.example.com/a.zip")
    );
    assert!(!info.update_available("1.1.0"));
    assert!(!info.update_available("2.0"));
    assert_eq!(checker.available_update("1.1.0"), None);
}

#[test]
fn corrupt_cache_entry_is_treated_as_absent() {
    let (store, transport, checker) = checker();
    store.set(UPDATE_CACHE, "{not json").unwrap();
    transport.reply(VERSION_BODY);

    let info = checker.check_for_update("1.0.0").unwrap();
    assert_eq!(info.latest_version.as_deref(), Some("1.2.0"));
    assert_eq!(transport.calls(), 1);
}
