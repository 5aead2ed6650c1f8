//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::directory::DirectoryService;
use crate::presenter::ListingPresenter;
use crate::store::{DirectoryStore, PgDirectoryStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Immutable configuration loaded at startup.
    config: Arc<Config>,

    /// Directory reads (listings, references, similarity).
    directory: Arc<DirectoryService>,

    /// HTML renderer for listing pages.
    presenter: ListingPresenter,
}

impl AppState {
    /// Create application state backed by PostgreSQL.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;
        info!("Connected to PostgreSQL");

        let store = Arc::new(PgDirectoryStore::new(pool, config.statement_timeout_secs));
        Self::with_store(config.clone(), store)
    }

    /// Create application state over any directory store.
    pub fn with_store(config: Config, store: Arc<dyn DirectoryStore>) -> Result<Self> {
        let config = Arc::new(config);
        let directory = Arc::new(DirectoryService::new(store, config.clone()));
        let presenter = ListingPresenter::new().context("failed to initialize presenter")?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                directory,
                presenter,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn directory(&self) -> &Arc<DirectoryService> {
        &self.inner.directory
    }

    pub fn presenter(&self) -> &ListingPresenter {
        &self.inner.presenter
    }

    /// Check if the directory store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.inner.directory.healthy().await
    }
}
