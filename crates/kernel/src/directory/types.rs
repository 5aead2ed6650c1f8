//! Directory listing types.
//!
//! Provides the value types shared by the listing pipeline:
//! - ListingFilter: user-selected predicates and pagination
//! - ReadRequest / ReferenceRequest: store-agnostic read descriptions
//! - ListingPage: one page of enriched rows with paging metadata

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::resolver::EnrichedRow;
use crate::config::ListingLimits;

/// Identifier filter for one foreign-key dimension.
///
/// `All` means no predicate is applied for the dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdFilter {
    #[default]
    All,
    Id(i64),
}

impl IdFilter {
    /// Coerce a raw identifier. Anything that is not an integer means `All`.
    pub fn parse(raw: &str) -> Self {
        raw.trim().parse::<i64>().map(Self::Id).unwrap_or(Self::All)
    }

    /// The selected identifier, if any.
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Id(id) => Some(*id),
        }
    }
}

impl From<Option<i64>> for IdFilter {
    fn from(value: Option<i64>) -> Self {
        value.map(Self::Id).unwrap_or(Self::All)
    }
}

impl fmt::Display for IdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for IdFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Id(id) => serializer.serialize_i64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for IdFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Int(id)) => Self::Id(id),
            Some(Raw::Text(text)) => Self::parse(&text),
            None => Self::All,
        })
    }
}

/// Sort order offered to directory views.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListingSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Alphabetical by name.
    Name,
}

/// User-selected predicate and pagination state for a directory view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
    #[serde(default)]
    pub category: IdFilter,

    #[serde(default)]
    pub market: IdFilter,

    /// Free-text search over name and description.
    #[serde(default)]
    pub search_text: Option<String>,

    #[serde(default)]
    pub sort: ListingSort,

    #[serde(default)]
    pub offset: u64,

    /// Page size; always at least 1.
    pub limit: u32,
}

impl ListingFilter {
    /// Defaults used when a view mounts.
    pub fn new(limits: &ListingLimits) -> Self {
        Self {
            category: IdFilter::All,
            market: IdFilter::All,
            search_text: None,
            sort: ListingSort::Newest,
            offset: 0,
            limit: limits.clamp(limits.default_page_size),
        }
    }

    /// Search text with surrounding whitespace removed; `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self::new(&ListingLimits::default())
    }
}

/// Tables holding primary directory rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryTable {
    Businesses,
    Products,
    ProductEmbeddings,
}

impl DirectoryTable {
    pub const ALL: [DirectoryTable; 3] = [
        DirectoryTable::Businesses,
        DirectoryTable::Products,
        DirectoryTable::ProductEmbeddings,
    ];

    /// Table name in the store.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Businesses => "businesses",
            Self::Products => "products",
            Self::ProductEmbeddings => "product_embeddings",
        }
    }

    /// Primary key column, used as the ordering tiebreaker.
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::ProductEmbeddings => "product_id",
            _ => "id",
        }
    }

    /// Columns matched by free-text search.
    pub fn search_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Businesses | Self::Products => &["name", "description"],
            Self::ProductEmbeddings => &[],
        }
    }

    /// Text shown when a listing has no rows.
    pub fn empty_text(&self) -> &'static str {
        match self {
            Self::Businesses => "No businesses match these filters.",
            Self::Products => "No products match these filters.",
            Self::ProductEmbeddings => "No embeddings stored.",
        }
    }

    /// Parse a URL segment such as `businesses`.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "businesses" => Some(Self::Businesses),
            "products" => Some(Self::Products),
            _ => None,
        }
    }
}

/// Side-loaded lookup tables used for name enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
    Categories,
    Markets,
    Owners,
}

impl ReferenceSource {
    pub const ALL: [ReferenceSource; 3] = [
        ReferenceSource::Categories,
        ReferenceSource::Markets,
        ReferenceSource::Owners,
    ];

    /// Table name in the store.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Categories => "business_categories",
            Self::Markets => "markets",
            Self::Owners => "profiles",
        }
    }

    /// Column holding the display label.
    pub fn label_column(&self) -> &'static str {
        match self {
            Self::Categories => "title",
            Self::Markets => "name",
            Self::Owners => "full_name",
        }
    }
}

/// Filter value types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Integer value.
    Integer(i64),
    /// Boolean value.
    Boolean(bool),
    /// UUID value.
    Uuid(Uuid),
    /// String value.
    Text(String),
    /// List of values, matched with IN.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Convert to string representation.
    pub fn as_string(&self) -> Option<String> {
        match self {
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Integer(i) => Some(i.to_string()),
            FilterValue::Boolean(b) => Some(b.to_string()),
            FilterValue::Uuid(u) => Some(u.to_string()),
            FilterValue::List(_) => None,
        }
    }

    /// Convert to integer if possible.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FilterValue::Integer(i) => Some(*i),
            FilterValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Convert to UUID if possible.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FilterValue::Uuid(u) => Some(*u),
            FilterValue::Text(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Ordering clause of a read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderClause {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderClause {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Inclusive row range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    pub start: u64,
    pub end: u64,
}

impl RowRange {
    /// Range covering `limit` rows starting at `offset`; `limit` must be positive.
    pub fn page(offset: u64, limit: u32) -> Self {
        let limit = u64::from(limit.max(1));
        Self {
            start: offset,
            end: offset.saturating_add(limit - 1),
        }
    }

    /// Number of rows covered.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A range always covers at least one row.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Owner restriction for "my listings" views.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub column: String,
    pub owner: Uuid,
}

/// Case-insensitive substring search across columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSearch {
    pub columns: Vec<String>,
    pub term: String,
}

/// Parameterized read against a primary directory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub table: DirectoryTable,

    /// Owner restriction, applied before every other predicate.
    pub scope: Option<TenantScope>,

    /// Equality predicates (IN for list values), keyed by column.
    pub predicates: BTreeMap<String, FilterValue>,

    pub search: Option<TextSearch>,

    pub order: OrderClause,

    pub range: RowRange,
}

impl ReadRequest {
    /// Whether an equality predicate is present for `field`.
    pub fn has_predicate(&self, field: &str) -> bool {
        self.predicates.contains_key(field)
    }
}

/// Read of a full reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRequest {
    pub source: ReferenceSource,
    pub order: OrderClause,
}

/// One page of enriched rows.
#[derive(Debug, Clone, Serialize)]
pub struct ListingPage<R> {
    pub rows: Vec<EnrichedRow<R>>,

    /// Total matching rows before paging.
    pub total: u64,

    pub offset: u64,

    pub limit: u64,

    pub has_next: bool,

    pub has_prev: bool,
}

impl<R> ListingPage<R> {
    /// Create a page with paging calculations.
    pub fn new(rows: Vec<EnrichedRow<R>>, total: u64, range: RowRange) -> Self {
        let limit = range.len();
        Self {
            rows,
            total,
            offset: range.start,
            limit,
            has_next: range.start.saturating_add(limit) < total,
            has_prev: range.start > 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
