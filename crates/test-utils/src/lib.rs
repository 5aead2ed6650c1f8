//! Bazaar test utilities.
//!
//! Helpers for integration testing: an in-memory directory store that
//! evaluates read requests the way the database does, fixture builders for
//! directory records, and assertion helpers.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use bazaar_kernel::directory::{
    Business, Category, DirectoryError, DirectoryTable, FilterValue, Market, Product,
    ProductEmbedding, Profile, ReadRequest, ReferenceRequest, ReferenceSource, SortDirection,
};
use bazaar_kernel::store::DirectoryStore;

/// In-memory [`DirectoryStore`].
///
/// A table that was never provisioned (or was dropped) fails every read with
/// `NotProvisioned`, like a missing relation in PostgreSQL.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    failures: RwLock<HashMap<String, DirectoryError>>,
    reads: RwLock<HashMap<String, usize>>,
    healthy: RwLock<bool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store with every directory table provisioned and empty.
    pub fn new() -> Self {
        let tables = DirectoryTable::ALL
            .iter()
            .map(DirectoryTable::name)
            .chain(ReferenceSource::ALL.iter().map(ReferenceSource::table))
            .map(|name| (name.to_string(), Vec::new()))
            .collect();

        Self {
            tables: RwLock::new(tables),
            failures: RwLock::new(HashMap::new()),
            reads: RwLock::new(HashMap::new()),
            healthy: RwLock::new(true),
        }
    }

    /// Insert a serializable record into `table`.
    pub fn insert<T: Serialize>(&self, table: &str, record: &T) {
        if let Ok(row) = serde_json::to_value(record) {
            self.insert_row(table, row);
        }
    }

    /// Insert a raw JSON row (use for malformed rows).
    pub fn insert_row(&self, table: &str, row: Value) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn insert_business(&self, business: &Business) {
        self.insert(DirectoryTable::Businesses.name(), business);
    }

    pub fn insert_product(&self, product: &Product) {
        self.insert(DirectoryTable::Products.name(), product);
    }

    pub fn insert_embedding(&self, embedding: &ProductEmbedding) {
        self.insert(DirectoryTable::ProductEmbeddings.name(), embedding);
    }

    pub fn insert_category(&self, category: &Category) {
        self.insert(ReferenceSource::Categories.table(), category);
    }

    pub fn insert_market(&self, market: &Market) {
        self.insert(ReferenceSource::Markets.table(), market);
    }

    pub fn insert_profile(&self, profile: &Profile) {
        self.insert(ReferenceSource::Owners.table(), profile);
    }

    /// Remove `table` entirely so reads report it as not provisioned.
    pub fn drop_table(&self, table: &str) {
        self.tables.write().remove(table);
    }

    /// Make every read of `table` fail with `error`.
    pub fn fail(&self, table: &str, error: DirectoryError) {
        self.failures.write().insert(table.to_string(), error);
    }

    /// Clear an injected failure.
    pub fn recover(&self, table: &str) {
        self.failures.write().remove(table);
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.write() = healthy;
    }

    /// Number of reads issued against `table` (rows, count and reference reads).
    pub fn reads(&self, table: &str) -> usize {
        self.reads.read().get(table).copied().unwrap_or(0)
    }

    fn rows_of(&self, table: &str) -> Result<Vec<Value>, DirectoryError> {
        *self.reads.write().entry(table.to_string()).or_default() += 1;

        if let Some(error) = self.failures.read().get(table) {
            return Err(error.clone());
        }
        self.tables
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| DirectoryError::not_provisioned(table))
    }

    fn matching(&self, request: &ReadRequest) -> Result<Vec<Value>, DirectoryError> {
        let rows = self.rows_of(request.table.name())?;
        Ok(rows
            .into_iter()
            .filter(|row| matches_request(row, request))
            .collect())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn fetch_rows(&self, request: &ReadRequest) -> Result<Vec<Value>, DirectoryError> {
        let mut rows = self.matching(request)?;

        let key = request.table.key_column();
        rows.sort_by(|a, b| {
            let primary = compare_json(a.get(&request.order.field), b.get(&request.order.field));
            let primary = match request.order.direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then_with(|| compare_json(a.get(key), b.get(key)))
        });

        let start = usize::try_from(request.range.start).unwrap_or(usize::MAX);
        let len = usize::try_from(request.range.len()).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(start).take(len).collect())
    }

    async fn count_rows(&self, request: &ReadRequest) -> Result<u64, DirectoryError> {
        Ok(self.matching(request)?.len() as u64)
    }

    async fn fetch_reference(
        &self,
        request: &ReferenceRequest,
    ) -> Result<Vec<Value>, DirectoryError> {
        let label = request.source.label_column();
        let mut rows: Vec<Value> = self
            .rows_of(request.source.table())?
            .into_iter()
            .map(|row| {
                serde_json::json!({
                    "id": row.get("id").cloned().unwrap_or(Value::Null),
                    label: row.get(label).cloned().unwrap_or(Value::Null),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            compare_json(a.get(label), b.get(label)).then_with(|| compare_json(a.get("id"), b.get("id")))
        });
        Ok(rows)
    }

    async fn probe(&self, table: &str) -> Result<(), DirectoryError> {
        self.rows_of(table).map(|_| ())
    }

    async fn healthy(&self) -> bool {
        *self.healthy.read()
    }
}

fn matches_request(row: &Value, request: &ReadRequest) -> bool {
    if let Some(scope) = &request.scope {
        let owner = row
            .get(&scope.column)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());
        if owner != Some(scope.owner) {
            return false;
        }
    }

    let predicates_match = request
        .predicates
        .iter()
        .all(|(field, value)| matches_value(row.get(field), value));
    if !predicates_match {
        return false;
    }

    match &request.search {
        Some(search) => {
            let term = search.term.to_lowercase();
            search.columns.iter().any(|column| {
                row.get(column)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(&term))
            })
        }
        None => true,
    }
}

fn matches_value(actual: Option<&Value>, expected: &FilterValue) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    match expected {
        FilterValue::Integer(i) => actual.as_i64() == Some(*i),
        FilterValue::Boolean(b) => actual.as_bool() == Some(*b),
        FilterValue::Text(s) => actual.as_str() == Some(s.as_str()),
        FilterValue::Uuid(u) => actual
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|id| id == *u),
        FilterValue::List(items) => items.iter().any(|item| matches_value(Some(actual), item)),
    }
}

/// Ordering with NULL sorting after every value, as PostgreSQL does for ASC.
fn compare_json(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a
                .as_str()
                .unwrap_or_default()
                .cmp(b.as_str().unwrap_or_default()),
        },
    }
}

/// Deterministic creation time: one second per id after a fixed epoch.
pub fn created_at(id: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_767_225_600 + id, 0).unwrap_or_default()
}

/// Create an active test business with no references.
pub fn test_business(id: i64, name: &str) -> Business {
    Business {
        id,
        name: name.to_string(),
        description: None,
        category_id: None,
        market_id: None,
        owner_id: None,
        status: "active".to_string(),
        address: None,
        phone: None,
        created_at: created_at(id),
    }
}

/// Create an active test product with no references.
pub fn test_product(id: i64, name: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        description: None,
        price: None,
        category_id: None,
        market_id: None,
        owner_id: None,
        business_id: None,
        status: "active".to_string(),
        image_url: None,
        created_at: created_at(id),
    }
}

pub fn test_category(id: i64, title: &str) -> Category {
    Category {
        id,
        title: title.to_string(),
    }
}

pub fn test_market(id: i64, name: &str) -> Market {
    Market {
        id,
        name: name.to_string(),
        region: None,
    }
}

pub fn test_profile(full_name: &str) -> Profile {
    Profile {
        id: Uuid::now_v7(),
        full_name: Some(full_name.to_string()),
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that every row of a JSON array carries a non-empty string at `key`.
    pub fn every_row_has_label(rows: &Value, key: &str) {
        let Some(rows) = rows.as_array() else {
            panic!("Expected a JSON array, got: {rows}");
        };
        for row in rows {
            let label = row.get(key).and_then(Value::as_str).unwrap_or_default();
            assert!(!label.is_empty(), "Expected non-empty '{key}' in row: {row}");
        }
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bazaar_kernel::config::ListingLimits;
    use bazaar_kernel::directory::{DirectoryQueryBuilder, ErrorKind, IdFilter, ListingFilter};

    fn builder(table: DirectoryTable) -> DirectoryQueryBuilder {
        DirectoryQueryBuilder::new(table, ListingLimits::default())
    }

    #[tokio::test]
    async fn filters_and_pages_like_the_database() {
        let store = MemoryStore::new();
        for id in 1..=5 {
            store.insert_product(&Product {
                market_id: Some(if id % 2 == 0 { 2 } else { 3 }),
                ..test_product(id, &format!("Product {id}"))
            });
        }

        let filter = ListingFilter {
            market: IdFilter::Id(3),
            limit: 2,
            ..Default::default()
        };
        let request = builder(DirectoryTable::Products).build(&filter);

        let rows = store.fetch_rows(&request).await.unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r["id"].as_i64()).collect();
        assert_eq!(ids, vec![5, 3]);
        assert_eq!(store.count_rows(&request).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn inactive_rows_are_hidden_from_public_reads() {
        let store = MemoryStore::new();
        store.insert_business(&test_business(1, "Open"));
        store.insert_business(&Business {
            status: "pending".to_string(),
            ..test_business(2, "Pending")
        });

        let request = builder(DirectoryTable::Businesses).build(&ListingFilter::default());
        assert_eq!(store.count_rows(&request).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dropped_table_is_not_provisioned() {
        let store = MemoryStore::new();
        store.drop_table("markets");

        let request = DirectoryQueryBuilder::reference(ReferenceSource::Markets);
        let err = store.fetch_reference(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotProvisioned);
        assert_eq!(store.reads("markets"), 1);
    }

    #[tokio::test]
    async fn reference_rows_sorted_by_label() {
        let store = MemoryStore::new();
        store.insert_category(&test_category(1, "Textiles"));
        store.insert_category(&test_category(2, "Crafts"));

        let rows = store
            .fetch_reference(&DirectoryQueryBuilder::reference(ReferenceSource::Categories))
            .await
            .unwrap();
        assert_eq!(rows[0]["title"], "Crafts");
        assert_eq!(rows[1]["id"], 1);
    }

    #[test]
    fn nulls_sort_last() {
        let null = Value::Null;
        let one = serde_json::json!(1);
        assert_eq!(compare_json(Some(&null), Some(&one)), Ordering::Greater);
        assert_eq!(compare_json(None, None), Ordering::Equal);
    }

    #[test]
    fn test_assertions() {
        let json = serde_json::json!([{"market_name": "Makola"}]);
        assert::every_row_has_label(&json, "market_name");
        assert::has_key(&json[0], "market_name");
        assert::contains("hello world", "world");
        assert::not_contains("hello world", "foo");
    }
}
