use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use keyward_cli::{commands, App, Cli, Commands, Outcome};
use keyward_core::store::{LICENSE_KEY, LICENSE_STATUS};
use keyward_core::{KeywardConfig, MemoryStore, StateStore, Transport, TransportError};

const CONFIG: &str = r#"
[server]
url = "https://licensing.example.com/api"

[product]
id = "acme-forms-pro"
version = "1.1.0"
site_url = "https://shop.example.com"
"#;

#[derive(Default)]
struct CannedTransport {
    replies: Mutex<VecDeque<Result<String, TransportError>>>,
    calls: AtomicUsize,
}

impl CannedTransport {
    fn with(replies: Vec<Result<&str, TransportError>>) -> Arc<Self> {
        let t = Self::default();
        *t.replies.lock().unwrap() = replies
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
        Arc::new(t)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for CannedTransport {
    fn post_form(
        &self,
        _fields: &[(&'static str, String)],
        _timeout: Duration,
    ) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("exhausted".to_string())))
    }
}

fn app_with(config: &str, transport: Arc<CannedTransport>) -> (App, Arc<MemoryStore>) {
    let config = KeywardConfig::from_toml(config).unwrap();
    let store = Arc::new(MemoryStore::new());
    let app = App::with_parts(config, store.clone(), transport);
    (app, store)
}

#[test]
fn cli_parses_commands() {
    let cli = Cli::try_parse_from(["keyward", "activate", "ABC123"]).unwrap();
    assert!(matches!(cli.command, Commands::Activate { ref key } if key == "ABC123"));

    let cli =
        Cli::try_parse_from(["keyward", "--config", "/etc/keyward.toml", "update", "--current", "2.0"])
            .unwrap();
    assert!(matches!(cli.command, Commands::Update { current: Some(ref v) } if v == "2.0"));
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/etc/keyward.toml"))
    );

    assert!(Cli::try_parse_from(["keyward"]).is_err());
}

#[test]
fn activate_then_deactivate_through_commands() {
    let transport = CannedTransport::with(vec![
        Ok(r#"{"success": true, "license": "valid", "expires": "2030-01-01"}"#),
        Ok(r#"{"success": true, "license": "deactivated"}"#),
    ]);
    let (app, store) = app_with(CONFIG, transport.clone());

    assert_eq!(
        commands::license::activate(&app, "ABC123").unwrap(),
        Outcome::Success
    );
    assert_eq!(store.get(LICENSE_STATUS).unwrap().as_deref(), Some("valid"));

    assert_eq!(
        commands::license::deactivate(&app).unwrap(),
        Outcome::Success
    );
    assert_eq!(store.get(LICENSE_STATUS).unwrap(), None);
    assert_eq!(store.get(LICENSE_KEY).unwrap().as_deref(), Some("ABC123"));
    assert_eq!(transport.calls(), 2);
}

#[test]
fn refused_activation_reports_failure() {
    let transport = CannedTransport::with(vec![Ok(
        r#"{"success": false, "error": "no_activations_left"}"#,
    )]);
    let (app, store) = app_with(CONFIG, transport);

    assert_eq!(
        commands::license::activate(&app, "ABC123").unwrap(),
        Outcome::Failed
    );
    assert!(store.is_empty());
}

#[test]
fn manage_disabled_blocks_activation_without_network() {
    let config = format!("{CONFIG}\n[admin]\nallow_manage = false\n");
    let transport = CannedTransport::with(vec![]);
    let (app, _store) = app_with(&config, transport.clone());

    assert_eq!(
        commands::license::activate(&app, "ABC123").unwrap(),
        Outcome::Failed
    );
    assert_eq!(transport.calls(), 0);
}

#[test]
fn set_key_and_reset() {
    let (app, store) = app_with(CONFIG, CannedTransport::with(vec![]));
    store.set(LICENSE_KEY, "OLD").unwrap();
    store.set(LICENSE_STATUS, "valid").unwrap();

    commands::license::set_key(&app, "NEW").unwrap();
    assert_eq!(store.get(LICENSE_KEY).unwrap().as_deref(), Some("NEW"));
    assert_eq!(store.get(LICENSE_STATUS).unwrap(), None);

    commands::license::reset(&app).unwrap();
    assert!(store.is_empty());
}

#[test]
fn update_never_fails_when_server_is_down() {
    let transport = CannedTransport::with(vec![Err(TransportError::Timeout(
        Duration::from_secs(5),
    ))]);
    let (app, _store) = app_with(CONFIG, transport.clone());

    assert_eq!(
        commands::update::run(&app, None).unwrap(),
        Outcome::Success
    );
    assert_eq!(transport.calls(), 1);
}

#[test]
fn update_requires_a_current_version() {
    let config = CONFIG.replace("version = \"1.1.0\"\n", "");
    let (app, _store) = app_with(&config, CannedTransport::with(vec![]));
    assert!(commands::update::run(&app, None).is_err());
    assert!(commands::update::run(&app, Some("1.0.0")).is_ok());
}
