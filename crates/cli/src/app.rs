//! Composition root: one place that wires store, transport and guard into the clients

use anyhow::{Context, Result};
use std::sync::Arc;

use keyward_core::{
    Action, FileStore, HttpTransport, KeywardConfig, LicenseClient, Role, SessionGuard,
    StateStore, Transport, UpdateChecker,
};

pub struct App {
    pub config: KeywardConfig,
    pub store: Arc<dyn StateStore>,
    pub client: LicenseClient,
    pub updates: UpdateChecker,
    guard: Arc<SessionGuard>,
}

impl App {
    /// Builds the app against the real licensing server and file store.
    pub fn from_config(config: KeywardConfig) -> Result<Self> {
        let store: Arc<dyn StateStore> = match &config.store.path {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(FileStore::in_config_dir().context("opening state store")?),
        };
        let transport = HttpTransport::new(config.server_url()?)
            .context("building licensing server transport")?;
        Ok(Self::with_parts(config, store, Arc::new(transport)))
    }

    /// Builds the app from explicit parts.
    pub fn with_parts(
        config: KeywardConfig,
        store: Arc<dyn StateStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let role = if config.admin.allow_manage {
            Role::Administrator
        } else {
            Role::Viewer
        };
        let guard = Arc::new(SessionGuard::new(role));
        let client = LicenseClient::new(
            store.clone(),
            transport.clone(),
            guard.clone(),
            config.client_settings(),
        );
        let updates = UpdateChecker::new(store.clone(), transport, config.update_settings());
        Self {
            config,
            store,
            client,
            updates,
            guard,
        }
    }

    /// Token for one operator-initiated action in this session.
    pub fn token(&self, action: Action) -> String {
        self.guard.issue(action)
    }
}
