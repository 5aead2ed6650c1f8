//! PostgreSQL directory store.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::DirectoryStore;
use crate::db;
use crate::directory::sql::{count_sql, probe_sql, reference_sql, select_sql};
use crate::directory::{DirectoryError, ReadRequest, ReferenceRequest};

/// Store backed by a sqlx connection pool.
///
/// Each read runs in its own short transaction so `SET LOCAL
/// statement_timeout` applies to it alone.
#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
    statement_timeout_secs: u32,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool, statement_timeout_secs: u32) -> Self {
        Self {
            pool,
            statement_timeout_secs,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self, table: &str) -> Result<Transaction<'static, Postgres>, DirectoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DirectoryError::from_sqlx(table, &e))?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}s'",
            self.statement_timeout_secs
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_sqlx(table, &e))?;

        Ok(tx)
    }

    async fn fetch_json(&self, table: &str, sql: &str) -> Result<Vec<Value>, DirectoryError> {
        debug!(table, sql, "directory read");

        let mut tx = self.begin(table).await?;
        let rows: Vec<Value> =
            sqlx::query_scalar(&format!("SELECT row_to_json(t) FROM ({sql}) t"))
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| DirectoryError::from_sqlx(table, &e))?;
        tx.commit()
            .await
            .map_err(|e| DirectoryError::from_sqlx(table, &e))?;

        Ok(rows)
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn fetch_rows(&self, request: &ReadRequest) -> Result<Vec<Value>, DirectoryError> {
        self.fetch_json(request.table.name(), &select_sql(request))
            .await
    }

    async fn count_rows(&self, request: &ReadRequest) -> Result<u64, DirectoryError> {
        let table = request.table.name();
        let sql = count_sql(request);
        debug!(table, sql, "directory count");

        let mut tx = self.begin(table).await?;
        let total: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DirectoryError::from_sqlx(table, &e))?;
        tx.commit()
            .await
            .map_err(|e| DirectoryError::from_sqlx(table, &e))?;

        u64::try_from(total)
            .map_err(|_| DirectoryError::malformed(table, format!("negative row count {total}")))
    }

    async fn fetch_reference(
        &self,
        request: &ReferenceRequest,
    ) -> Result<Vec<Value>, DirectoryError> {
        self.fetch_json(request.source.table(), &reference_sql(request))
            .await
    }

    async fn probe(&self, table: &str) -> Result<(), DirectoryError> {
        let mut tx = self.begin(table).await?;
        sqlx::query(&probe_sql(table))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DirectoryError::from_sqlx(table, &e))?;
        tx.commit()
            .await
            .map_err(|e| DirectoryError::from_sqlx(table, &e))?;
        Ok(())
    }

    async fn healthy(&self) -> bool {
        db::check_health(&self.pool).await
    }
}
