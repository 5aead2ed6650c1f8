//! Directory query and aggregation layer.
//!
//! Assembles filtered, paginated, cross-referenced listings of businesses
//! and products:
//! - `FilterState` holds the user's filter and a generation counter
//! - `DirectoryQueryBuilder` turns a filter into a `ReadRequest`
//! - `DirectoryService` runs the reads and enriches rows via `EnrichmentResolver`
//! - `ListingController` owns the fetch lifecycle of one view

mod error;
mod fetch;
mod filter_state;
mod query_builder;
mod records;
mod reference;
mod resolver;
mod service;
pub mod similarity;
pub mod sql;
mod types;

pub use error::{DirectoryError, ErrorKind};
pub use fetch::{FetchFailure, FetchState, FetchTicket, ListingController};
pub use filter_state::FilterState;
pub use query_builder::{ACTIVE_STATUS, DirectoryQueryBuilder, escape_like_wildcards};
pub use records::{
    Business, Category, DirectoryRecord, ForeignKey, Market, Product, ProductEmbedding, Profile,
    RecordKey, decode_rows,
};
pub use reference::{ReferenceOption, ReferenceSet, ReferenceTable};
pub use resolver::{EnrichedRow, EnrichmentResolver};
pub use service::{DirectoryService, SimilarProduct, TableStatus};
pub use types::{
    DirectoryTable, FilterValue, IdFilter, ListingFilter, ListingPage, ListingSort, OrderClause,
    ReadRequest, ReferenceRequest, ReferenceSource, RowRange, SortDirection, TenantScope,
    TextSearch,
};
