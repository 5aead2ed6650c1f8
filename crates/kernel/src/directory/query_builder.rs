//! Listing query builder.
//!
//! Translates a [`ListingFilter`] into a [`ReadRequest`]:
//! - base predicate (owner scope, or `status = 'active'`)
//! - category / market equality only when selected
//! - case-insensitive search over name and description
//! - ordering and an inclusive row range
//!
//! Building is pure: the same filter always produces an equal request.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::types::{
    DirectoryTable, FilterValue, IdFilter, ListingFilter, ListingSort, OrderClause,
    ReadRequest, ReferenceRequest, ReferenceSource, RowRange, TenantScope, TextSearch,
};
use crate::config::ListingLimits;

/// Status a row must carry to appear in public listings.
pub const ACTIVE_STATUS: &str = "active";

/// Query builder for one primary directory table.
#[derive(Debug, Clone)]
pub struct DirectoryQueryBuilder {
    table: DirectoryTable,
    limits: ListingLimits,
    scope: Option<Uuid>,
}

impl DirectoryQueryBuilder {
    pub fn new(table: DirectoryTable, limits: ListingLimits) -> Self {
        Self {
            table,
            limits,
            scope: None,
        }
    }

    /// Restrict reads to rows owned by `owner`.
    ///
    /// Owners see their own rows in every status, so the public status
    /// predicate is not applied.
    pub fn scoped_to(mut self, owner: Uuid) -> Self {
        self.scope = Some(owner);
        self
    }

    pub fn with_scope(mut self, scope: Option<Uuid>) -> Self {
        self.scope = scope;
        self
    }

    pub fn table(&self) -> DirectoryTable {
        self.table
    }

    /// Build the read request for one page of `filter`.
    pub fn build(&self, filter: &ListingFilter) -> ReadRequest {
        let mut predicates = BTreeMap::new();

        let scope = self.scope.map(|owner| TenantScope {
            column: "owner_id".to_string(),
            owner,
        });
        if scope.is_none() {
            predicates.insert(
                "status".to_string(),
                FilterValue::Text(ACTIVE_STATUS.to_string()),
            );
        }

        if let IdFilter::Id(id) = filter.category {
            predicates.insert("category_id".to_string(), FilterValue::Integer(id));
        }
        if let IdFilter::Id(id) = filter.market {
            predicates.insert("market_id".to_string(), FilterValue::Integer(id));
        }

        let search = filter.search_term().and_then(|term| {
            let columns = self.table.search_columns();
            (!columns.is_empty()).then(|| TextSearch {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                term: term.to_string(),
            })
        });

        ReadRequest {
            table: self.table,
            scope,
            predicates,
            search,
            order: sort_order(filter.sort),
            range: RowRange::page(filter.offset, self.limits.clamp(filter.limit)),
        }
    }

    /// Public rows of this table with the given ids, in key order.
    pub fn lookup(&self, ids: &[i64]) -> ReadRequest {
        let mut predicates = BTreeMap::new();
        predicates.insert(
            "status".to_string(),
            FilterValue::Text(ACTIVE_STATUS.to_string()),
        );
        predicates.insert(
            self.table.key_column().to_string(),
            FilterValue::List(ids.iter().copied().map(FilterValue::Integer).collect()),
        );

        ReadRequest {
            table: self.table,
            scope: None,
            predicates,
            search: None,
            order: OrderClause::asc(self.table.key_column()),
            range: RowRange::page(0, u32::try_from(ids.len()).unwrap_or(u32::MAX)),
        }
    }

    /// Every stored embedding, capped at `candidates` rows.
    pub fn embeddings(candidates: u32) -> ReadRequest {
        let table = DirectoryTable::ProductEmbeddings;
        ReadRequest {
            table,
            scope: None,
            predicates: BTreeMap::new(),
            search: None,
            order: OrderClause::asc(table.key_column()),
            range: RowRange::page(0, candidates),
        }
    }

    /// Full reference table, ordered alphabetically by label.
    pub fn reference(source: ReferenceSource) -> ReferenceRequest {
        ReferenceRequest {
            source,
            order: OrderClause::asc(source.label_column()),
        }
    }
}

fn sort_order(sort: ListingSort) -> OrderClause {
    match sort {
        ListingSort::Newest => OrderClause::desc("created_at"),
        ListingSort::Oldest => OrderClause::asc("created_at"),
        ListingSort::Name => OrderClause::asc("name"),
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
pub fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::directory::types::SortDirection;

    fn products() -> DirectoryQueryBuilder {
        DirectoryQueryBuilder::new(DirectoryTable::Products, ListingLimits::default())
    }

    #[test]
    fn unselected_dimensions_add_no_predicates() {
        let request = products().build(&ListingFilter::default());

        assert!(!request.has_predicate("category_id"));
        assert!(!request.has_predicate("market_id"));
        assert_eq!(
            request.predicates.get("status"),
            Some(&FilterValue::Text("active".to_string()))
        );
        assert_eq!(request.predicates.len(), 1);
    }

    #[test]
    fn selected_category_adds_only_that_equality() {
        let filter = ListingFilter {
            category: IdFilter::Id(4),
            ..Default::default()
        };
        let request = products().build(&filter);

        assert_eq!(
            request.predicates.get("category_id"),
            Some(&FilterValue::Integer(4))
        );
        assert!(!request.has_predicate("market_id"));
    }

    #[test]
    fn identical_filters_build_identical_requests() {
        let filter = ListingFilter {
            market: IdFilter::Id(3),
            search_text: Some("basket".to_string()),
            sort: ListingSort::Name,
            offset: 40,
            ..Default::default()
        };

        let first = serde_json::to_string(&products().build(&filter)).unwrap();
        let second = serde_json::to_string(&products().build(&filter.clone())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn range_is_offset_plus_limit() {
        let filter = ListingFilter {
            offset: 20,
            limit: 20,
            ..Default::default()
        };
        let request = products().build(&filter);
        assert_eq!(request.range, RowRange { start: 20, end: 39 });
    }

    #[test]
    fn oversized_limit_is_clamped() {
        let filter = ListingFilter {
            limit: 10_000,
            ..Default::default()
        };
        let request = products().build(&filter);
        assert_eq!(request.range.len(), 100);
    }

    #[test]
    fn owner_scope_replaces_status_predicate() {
        let owner = Uuid::now_v7();
        let request = DirectoryQueryBuilder::new(DirectoryTable::Businesses, ListingLimits::default())
            .scoped_to(owner)
            .build(&ListingFilter::default());

        assert_eq!(request.scope.as_ref().map(|s| s.owner), Some(owner));
        assert!(!request.has_predicate("status"));
    }

    #[test]
    fn default_sort_is_newest_first() {
        let request = products().build(&ListingFilter::default());
        assert_eq!(request.order.field, "created_at");
        assert_eq!(request.order.direction, SortDirection::Desc);
    }

    #[test]
    fn search_covers_name_and_description() {
        let filter = ListingFilter {
            search_text: Some("  shea ".to_string()),
            ..Default::default()
        };
        let search = products().build(&filter).search.unwrap();
        assert_eq!(search.term, "shea");
        assert_eq!(search.columns, vec!["name", "description"]);
    }

    #[test]
    fn reference_requests_order_by_label() {
        let request = DirectoryQueryBuilder::reference(ReferenceSource::Categories);
        assert_eq!(request.order, OrderClause::asc("title"));
    }

    #[test]
    fn lookup_matches_ids() {
        let request = products().lookup(&[3, 1]);
        assert_eq!(
            request.predicates.get("id"),
            Some(&FilterValue::List(vec![
                FilterValue::Integer(3),
                FilterValue::Integer(1)
            ]))
        );
        assert_eq!(request.range.len(), 2);
    }

    #[test]
    fn like_wildcards_escaped() {
        assert_eq!(escape_like_wildcards("50%_off\\"), "50\\%\\_off\\\\");
    }
}
