//! Boundary to the relational store.
//!
//! The directory layer talks to storage only through [`DirectoryStore`].
//! Implementations return raw JSON rows and classify every failure into a
//! [`DirectoryError`] before it crosses this boundary.

mod postgres;

pub use postgres::PgDirectoryStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::directory::{DirectoryError, ReadRequest, ReferenceRequest};

/// Read access to directory tables.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Rows of `request.table` matching the request, in request order and range.
    async fn fetch_rows(&self, request: &ReadRequest) -> Result<Vec<Value>, DirectoryError>;

    /// Number of rows matching the request predicates, ignoring the range.
    async fn count_rows(&self, request: &ReadRequest) -> Result<u64, DirectoryError>;

    /// Every row of a reference table as `{id, <label column>}` objects.
    async fn fetch_reference(&self, request: &ReferenceRequest)
    -> Result<Vec<Value>, DirectoryError>;

    /// Succeeds when `table` exists and is readable.
    async fn probe(&self, table: &str) -> Result<(), DirectoryError>;

    /// Whether the store is reachable at all.
    async fn healthy(&self) -> bool;
}
