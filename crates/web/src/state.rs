//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::discovery::{self, DiscoveryIndex};
use crate::services::email::EmailService;
use crate::services::photos::PhotoService;

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("email transport error: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and the discovery index.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    discovery: DiscoveryIndex,
    email: Option<EmailService>,
    photos: PhotoService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the email transport cannot be constructed.
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let email = config
            .email
            .as_ref()
            .map(EmailService::new)
            .transpose()?;
        let photos = PhotoService::new(config.upload_dir.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                discovery: DiscoveryIndex::new(),
                email,
                photos,
            }),
        })
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the discovery index.
    #[must_use]
    pub fn discovery(&self) -> &DiscoveryIndex {
        &self.inner.discovery
    }

    /// Get a reference to the email service, if configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Get a reference to the photo service.
    #[must_use]
    pub fn photos(&self) -> &PhotoService {
        &self.inner.photos
    }

    /// Kick off a background (re)build of the discovery index.
    ///
    /// Called at startup and after store writes. Queries served before the
    /// build completes return empty results.
    pub fn start_discovery_indexing(&self) {
        discovery::rebuild_async(self.inner.discovery.clone(), self.inner.pool.clone());
    }
}
