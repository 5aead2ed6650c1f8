//! Typed directory records.
//!
//! Rows arrive from the store as JSON objects and are decoded into these
//! types at the boundary. A row that fails to decode is dropped and logged;
//! it never aborts its siblings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::types::{DirectoryTable, ReferenceSource};

/// Key of a primary or reference row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Uuid(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Uuid> for RecordKey {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

/// A declared foreign key and how its label is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    /// Column on the primary row.
    pub field: &'static str,
    /// Reference table the key points into.
    pub source: ReferenceSource,
    /// Name of the enrichment slot on the listing row.
    pub name_field: &'static str,
    /// Label used when the key is absent or unknown.
    pub fallback: &'static str,
}

const CATEGORY_NAME: ForeignKey = ForeignKey {
    field: "category_id",
    source: ReferenceSource::Categories,
    name_field: "category_name",
    fallback: "Uncategorized",
};

const MARKET_NAME: ForeignKey = ForeignKey {
    field: "market_id",
    source: ReferenceSource::Markets,
    name_field: "market_name",
    fallback: "No Market",
};

const OWNER_NAME: ForeignKey = ForeignKey {
    field: "owner_id",
    source: ReferenceSource::Owners,
    name_field: "owner_name",
    fallback: "Unknown Owner",
};

/// A row type stored in a primary directory table.
pub trait DirectoryRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table the rows live in.
    const TABLE: DirectoryTable;

    /// Foreign keys enriched with reference labels, in resolution order.
    const FOREIGN_KEYS: &'static [ForeignKey];

    fn key(&self) -> RecordKey;

    /// Value of the foreign key column `field`, if set.
    fn foreign_key(&self, field: &str) -> Option<RecordKey>;

    /// Reference tables needed to enrich this record type.
    fn reference_sources() -> Vec<ReferenceSource> {
        Self::FOREIGN_KEYS.iter().map(|fk| fk.source).collect()
    }
}

/// A business listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub market_id: Option<i64>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub status: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DirectoryRecord for Business {
    const TABLE: DirectoryTable = DirectoryTable::Businesses;
    const FOREIGN_KEYS: &'static [ForeignKey] = &[CATEGORY_NAME, MARKET_NAME, OWNER_NAME];

    fn key(&self) -> RecordKey {
        RecordKey::Int(self.id)
    }

    fn foreign_key(&self, field: &str) -> Option<RecordKey> {
        match field {
            "category_id" => self.category_id.map(RecordKey::Int),
            "market_id" => self.market_id.map(RecordKey::Int),
            "owner_id" => self.owner_id.map(RecordKey::Uuid),
            _ => None,
        }
    }
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub market_id: Option<i64>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub business_id: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DirectoryRecord for Product {
    const TABLE: DirectoryTable = DirectoryTable::Products;
    const FOREIGN_KEYS: &'static [ForeignKey] = &[CATEGORY_NAME, MARKET_NAME];

    fn key(&self) -> RecordKey {
        RecordKey::Int(self.id)
    }

    fn foreign_key(&self, field: &str) -> Option<RecordKey> {
        match field {
            "category_id" => self.category_id.map(RecordKey::Int),
            "market_id" => self.market_id.map(RecordKey::Int),
            _ => None,
        }
    }
}

/// Stored embedding for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEmbedding {
    pub product_id: i64,
    pub embedding: Vec<f32>,
}

impl DirectoryRecord for ProductEmbedding {
    const TABLE: DirectoryTable = DirectoryTable::ProductEmbeddings;
    const FOREIGN_KEYS: &'static [ForeignKey] = &[];

    fn key(&self) -> RecordKey {
        RecordKey::Int(self.product_id)
    }

    fn foreign_key(&self, _field: &str) -> Option<RecordKey> {
        None
    }
}

/// Business category reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
}

/// Market reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// Owner profile reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Decode raw rows, dropping any that do not match `R`.
pub fn decode_rows<R: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<R> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value::<R>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(table, index, error = %e, "dropping malformed row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_drops_only_malformed_rows() {
        let rows = vec![
            json!({"id": 1, "title": "Food"}),
            json!({"id": "not-a-number", "title": "Crafts"}),
            json!({"id": 3, "title": "Textiles"}),
        ];

        let categories: Vec<Category> = decode_rows("business_categories", rows);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].title, "Food");
        assert_eq!(categories[1].id, 3);
    }

    #[test]
    fn business_foreign_keys() {
        let owner = Uuid::now_v7();
        let business: Business = serde_json::from_value(json!({
            "id": 4,
            "name": "Mama Ngozi Foods",
            "category_id": 2,
            "owner_id": owner,
            "status": "active",
            "created_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(business.foreign_key("category_id"), Some(RecordKey::Int(2)));
        assert_eq!(business.foreign_key("market_id"), None);
        assert_eq!(business.foreign_key("owner_id"), Some(RecordKey::Uuid(owner)));
        assert_eq!(business.key(), RecordKey::Int(4));
        assert_eq!(Business::reference_sources().len(), 3);
    }

    #[test]
    fn product_price_accepts_numbers() {
        let product: Product = serde_json::from_value(json!({
            "id": 9,
            "name": "Shea butter",
            "price": 12.5,
            "status": "active",
            "created_at": "2026-03-01T10:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(product.price, Some(12.5));
        assert_eq!(
            Product::reference_sources(),
            vec![ReferenceSource::Categories, ReferenceSource::Markets]
        );
    }

    #[test]
    fn record_key_untagged() {
        let int: RecordKey = serde_json::from_value(json!(5)).unwrap();
        assert_eq!(int, RecordKey::Int(5));

        let id = Uuid::now_v7();
        let uuid: RecordKey = serde_json::from_value(json!(id.to_string())).unwrap();
        assert_eq!(uuid, RecordKey::Uuid(id));

        let text: RecordKey = serde_json::from_value(json!("slug")).unwrap();
        assert_eq!(text, RecordKey::Text("slug".to_string()));
    }
}
