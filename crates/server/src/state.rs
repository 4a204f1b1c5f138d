//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::LedgerStore;
use crate::identity::IdentityVerifier;
use crate::services::LedgerService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store and the identity verifier are
/// injected here rather than reached through globals.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    ledger: LedgerService,
    verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn LedgerStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                ledger: LedgerService::new(store),
                verifier,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the post/request ledger.
    #[must_use]
    pub fn ledger(&self) -> &LedgerService {
        &self.inner.ledger
    }

    /// Get a reference to the identity verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn IdentityVerifier {
        self.inner.verifier.as_ref()
    }
}
