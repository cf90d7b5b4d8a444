//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::session::SessionRegistry;
use crate::store::{StoreClient, StoreError};
use crate::tools::ToolDispatcher;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources: configuration, the upstream store client, the session
/// registry, and the tool dispatcher built over both.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    sessions: Arc<SessionRegistry>,
    dispatcher: ToolDispatcher<StoreClient>,
}

impl AppState {
    /// Create a new application state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, StoreError> {
        let store = StoreClient::new(&config)?;
        let sessions = Arc::new(SessionRegistry::new(config.session_ttl));
        let dispatcher = ToolDispatcher::new(store, Arc::clone(&sessions));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                dispatcher,
            }),
        })
    }

    /// Get a reference to the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get a reference to the session registry.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.inner.sessions
    }

    /// Get a reference to the tool dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &ToolDispatcher<StoreClient> {
        &self.inner.dispatcher
    }
}
