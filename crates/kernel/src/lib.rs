//! Bazaar Kernel Library
//!
//! Directory query and aggregation layer for the regional business and
//! market directory, plus its HTTP surface. The `bazaar` binary is the
//! entry point for running the server.

pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod presenter;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
