//! Error taxonomy for directory reads.
//!
//! Every store failure is classified into one of four kinds at the store
//! boundary. Callers branch on [`ErrorKind`], never on message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed directory read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The table does not exist yet.
    NotProvisioned,
    /// Row-level security rejected the read.
    PermissionDenied,
    /// Network failure or timeout; retry by refetching.
    Transient,
    /// The store answered with something we could not interpret.
    Malformed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotProvisioned => "not_provisioned",
            Self::PermissionDenied => "permission_denied",
            Self::Transient => "transient",
            Self::Malformed => "malformed",
        }
    }
}

/// A classified directory read failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error(
        "the `{table}` table has not been provisioned yet; run `bazaar setup` to create the directory schema"
    )]
    NotProvisioned { table: String },

    #[error(
        "permission denied while reading `{table}`; check the row-level security policies for this role ({detail})"
    )]
    PermissionDenied { table: String, detail: String },

    #[error("the directory store is temporarily unreachable while reading `{table}`; please try again ({detail})")]
    Transient { table: String, detail: String },

    #[error("unexpected response while reading `{table}`: {detail}")]
    Malformed { table: String, detail: String },
}

/// SQLSTATE for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";
/// PostgREST code for a relation missing from the schema cache.
const POSTGREST_MISSING_RELATION: &str = "PGRST205";
/// SQLSTATE for `insufficient_privilege`.
const INSUFFICIENT_PRIVILEGE: &str = "42501";
/// SQLSTATE for `query_canceled` (statement timeout).
const QUERY_CANCELED: &str = "57014";

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotProvisioned { .. } => ErrorKind::NotProvisioned,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Transient { .. } => ErrorKind::Transient,
            Self::Malformed { .. } => ErrorKind::Malformed,
        }
    }

    /// Table the failed read targeted.
    pub fn table(&self) -> &str {
        match self {
            Self::NotProvisioned { table }
            | Self::PermissionDenied { table, .. }
            | Self::Transient { table, .. }
            | Self::Malformed { table, .. } => table,
        }
    }

    /// Only transient failures are worth a user-triggered retry.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    pub fn not_provisioned(table: &str) -> Self {
        Self::NotProvisioned {
            table: table.to_string(),
        }
    }

    pub fn permission_denied(table: &str, detail: impl Into<String>) -> Self {
        Self::PermissionDenied {
            table: table.to_string(),
            detail: detail.into(),
        }
    }

    pub fn transient(table: &str, detail: impl Into<String>) -> Self {
        Self::Transient {
            table: table.to_string(),
            detail: detail.into(),
        }
    }

    pub fn malformed(table: &str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            table: table.to_string(),
            detail: detail.into(),
        }
    }

    /// Classify a store error from its code and message.
    ///
    /// Codes win over message text. Unrecognized database errors are
    /// treated as transient.
    pub fn classify(table: &str, code: Option<&str>, message: &str) -> Self {
        match code {
            Some(UNDEFINED_TABLE | POSTGREST_MISSING_RELATION) => {
                return Self::not_provisioned(table);
            }
            Some(INSUFFICIENT_PRIVILEGE) => return Self::permission_denied(table, message),
            Some(QUERY_CANCELED) => return Self::transient(table, message),
            _ => {}
        }

        let lower = message.to_lowercase();
        if lower.contains("relation") && lower.contains("does not exist") {
            Self::not_provisioned(table)
        } else if lower.contains("permission denied") || lower.contains("row-level security") {
            Self::permission_denied(table, message)
        } else {
            Self::transient(table, message)
        }
    }

    /// Classify an sqlx error raised while reading `table`.
    pub fn from_sqlx(table: &str, error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db) => {
                Self::classify(table, db.code().as_deref(), db.message())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::transient(table, error.to_string()),
            sqlx::Error::RowNotFound
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::Protocol(_) => Self::malformed(table, error.to_string()),
            other => Self::transient(table, other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_relation_codes_are_not_provisioned() {
        let pg = DirectoryError::classify("markets", Some("42P01"), "relation \"markets\" does not exist");
        assert_eq!(pg.kind(), ErrorKind::NotProvisioned);

        let rest = DirectoryError::classify("markets", Some("PGRST205"), "Could not find the table");
        assert_eq!(rest.kind(), ErrorKind::NotProvisioned);
        assert_eq!(rest.table(), "markets");
    }

    #[test]
    fn message_fallback_without_code() {
        let missing = DirectoryError::classify("products", None, "relation \"public.products\" does not exist");
        assert_eq!(missing.kind(), ErrorKind::NotProvisioned);

        let denied = DirectoryError::classify(
            "profiles",
            None,
            "new row violates row-level security policy for table \"profiles\"",
        );
        assert_eq!(denied.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn privilege_code_is_permission_denied() {
        let err = DirectoryError::classify("businesses", Some("42501"), "permission denied for table businesses");
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(!err.is_retryable());
    }

    #[test]
    fn statement_timeout_is_transient() {
        let err = DirectoryError::classify("products", Some("57014"), "canceling statement due to statement timeout");
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.is_retryable());
    }

    #[test]
    fn unknown_database_errors_are_transient() {
        let err = DirectoryError::classify("products", Some("53300"), "too many connections");
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn sqlx_pool_errors_are_transient() {
        let err = DirectoryError::from_sqlx("markets", &sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn sqlx_decode_errors_are_malformed() {
        let err = DirectoryError::from_sqlx("markets", &sqlx::Error::ColumnNotFound("name".into()));
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn messages_are_distinct_per_kind() {
        let kinds = [
            DirectoryError::not_provisioned("markets"),
            DirectoryError::permission_denied("markets", "denied"),
            DirectoryError::transient("markets", "timeout"),
            DirectoryError::malformed("markets", "bad json"),
        ];
        let messages: std::collections::HashSet<String> =
            kinds.iter().map(ToString::to_string).collect();
        assert_eq!(messages.len(), kinds.len());
        assert!(kinds[0].to_string().contains("bazaar setup"));
        assert!(kinds[1].to_string().contains("row-level security"));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotProvisioned).unwrap();
        assert_eq!(json, "\"not_provisioned\"");
        assert_eq!(ErrorKind::PermissionDenied.as_str(), "permission_denied");
    }
}
