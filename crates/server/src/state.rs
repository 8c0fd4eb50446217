//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StratusConfig;
use crate::platform::{AppwriteClient, PlatformError};
use crate::services::{FileService, IdentityGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the platform client, and the services built on it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StratusConfig,
    platform: AppwriteClient,
    identity: IdentityGateway<AppwriteClient>,
    files: FileService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The platform client is built once and injected into the services
    /// that depend on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform client cannot be built.
    pub fn new(config: StratusConfig) -> Result<Self, PlatformError> {
        let platform = AppwriteClient::new(&config.platform)?;
        let identity = IdentityGateway::new(
            Arc::new(platform.clone()),
            config.avatar_placeholder_url.clone(),
        );
        let files = FileService::new(platform.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                platform,
                identity,
                files,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &StratusConfig {
        &self.inner.config
    }

    /// Get a reference to the platform client.
    #[must_use]
    pub fn platform(&self) -> &AppwriteClient {
        &self.inner.platform
    }

    /// Get a reference to the identity gateway.
    #[must_use]
    pub fn identity(&self) -> &IdentityGateway<AppwriteClient> {
        &self.inner.identity
    }

    /// Get a reference to the file service.
    #[must_use]
    pub fn files(&self) -> &FileService {
        &self.inner.files
    }
}
