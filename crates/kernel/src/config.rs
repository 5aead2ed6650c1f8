//! Configuration loaded from environment variables.
//!
//! Loaded once at process start, validated once, and shared immutably
//! (`Arc<Config>`) with every component that needs it.

use std::env;

use anyhow::{Context, Result, bail};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Per-read statement timeout in seconds (default: 10).
    pub statement_timeout_secs: u32,

    /// Paging limits handed to filter state and query builders.
    pub listing: ListingLimits,

    /// Maximum embeddings scanned by a similarity search (default: 500).
    pub similarity_candidates: u32,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

/// Paging limits for directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
    /// Page size used when a view mounts (default: 20).
    pub default_page_size: u32,

    /// Upper bound for any requested page size (default: 100).
    pub max_page_size: u32,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ListingLimits {
    /// Clamp a requested page size into `[1, max_page_size]`.
    pub fn clamp(&self, requested: u32) -> u32 {
        requested.clamp(1, self.max_page_size.max(1))
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let statement_timeout_secs = env::var("STATEMENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("STATEMENT_TIMEOUT_SECS must be a valid u32")?;

        let default_page_size = env::var("DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .context("DEFAULT_PAGE_SIZE must be a valid u32")?;

        let max_page_size = env::var("MAX_PAGE_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .context("MAX_PAGE_SIZE must be a valid u32")?;

        let similarity_candidates = env::var("SIMILARITY_CANDIDATES")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .context("SIMILARITY_CANDIDATES must be a valid u32")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let config = Self {
            port,
            database_url,
            database_max_connections,
            statement_timeout_secs,
            listing: ListingLimits {
                default_page_size,
                max_page_size,
            },
            similarity_candidates,
            cors_allowed_origins,
        };
        config.validate()?;

        Ok(config)
    }

    /// Configuration for in-process use without a database (tests, demos).
    pub fn offline() -> Self {
        Self {
            port: 3000,
            database_url: String::new(),
            database_max_connections: 1,
            statement_timeout_secs: 10,
            listing: ListingLimits::default(),
            similarity_candidates: 500,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }

    /// Reject combinations that would make every listing request invalid.
    pub fn validate(&self) -> Result<()> {
        if self.listing.max_page_size == 0 {
            bail!("MAX_PAGE_SIZE must be at least 1");
        }
        if self.listing.default_page_size == 0
            || self.listing.default_page_size > self.listing.max_page_size
        {
            bail!(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE ({})",
                self.listing.max_page_size
            );
        }
        if self.statement_timeout_secs == 0 {
            bail!("STATEMENT_TIMEOUT_SECS must be at least 1");
        }
        if self.similarity_candidates == 0 {
            bail!("SIMILARITY_CANDIDATES must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_config_is_valid() {
        assert!(Config::offline().validate().is_ok());
    }

    #[test]
    fn default_page_size_above_max_is_rejected() {
        let mut config = Config::offline();
        config.listing = ListingLimits {
            default_page_size: 200,
            max_page_size: 100,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_page_size_is_rejected() {
        let mut config = Config::offline();
        config.listing.max_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn clamp_keeps_limit_positive_and_bounded() {
        let limits = ListingLimits::default();
        assert_eq!(limits.clamp(0), 1);
        assert_eq!(limits.clamp(20), 20);
        assert_eq!(limits.clamp(10_000), 100);
    }
}
