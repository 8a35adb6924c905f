//! Shared fixtures: a scripted transport that counts calls

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyward_core::{
    Action, ClientSettings, LicenseClient, MemoryStore, Role, SessionGuard, Transport,
    TransportError,
};

pub const PRODUCT_ID: &str = "acme-forms-pro";
pub const SITE_URL: &str = "https://shop.example.com";

/// Transport that replays queued replies and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String, TransportError>>>,
    requests: Mutex<Vec<Vec<(String, String)>>>,
    timeouts: Mutex<Vec<Duration>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
    }

    pub fn fail(&self, err: TransportError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn last_timeout(&self) -> Option<Duration> {
        self.timeouts.lock().unwrap().last().copied()
    }
}

impl Transport for ScriptedTransport {
    fn post_form(
        &self,
        fields: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        self.timeouts.lock().unwrap().push(timeout);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string())))
    }
}

pub fn field(request: &[(String, String)], name: &str) -> Option<String> {
    request
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub guard: Arc<SessionGuard>,
    pub client: LicenseClient,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_role(Role::Administrator)
    }

    pub fn with_role(role: Role) -> Self {
        let store = Arc::new(MemoryStore::new());
        let transport = ScriptedTransport::new();
        let guard = Arc::new(SessionGuard::new(role));
        let mut settings = ClientSettings::new(PRODUCT_ID, SITE_URL);
        settings.product_name = "Acme Forms Pro".to_string();
        let client = LicenseClient::new(store.clone(), transport.clone(), guard.clone(), settings);
        Self {
            store,
            transport,
            guard,
            client,
        }
    }

    pub fn token(&self, action: Action) -> String {
        self.guard.issue(action)
    }
}
