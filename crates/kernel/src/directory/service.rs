//! Directory service.
//!
//! Runs one fetch cycle: primary rows, total count and every reference table
//! the record type declares are read concurrently, then decoded and enriched.
//! Nothing is cached between cycles.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::DirectoryError;
use super::query_builder::DirectoryQueryBuilder;
use super::records::{DirectoryRecord, Product, ProductEmbedding, decode_rows};
use super::reference::{ReferenceOption, ReferenceSet, ReferenceTable};
use super::resolver::{EnrichedRow, EnrichmentResolver};
use super::similarity;
use super::types::{
    DirectoryTable, ListingFilter, ListingPage, ReadRequest, ReferenceSource,
};
use crate::config::{Config, ListingLimits};
use crate::store::DirectoryStore;

/// A product ranked by embedding similarity.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarProduct {
    pub score: f32,

    #[serde(flatten)]
    pub product: EnrichedRow<Product>,
}

/// Probe outcome for one table.
#[derive(Debug, Clone)]
pub struct TableStatus {
    pub table: &'static str,
    pub error: Option<DirectoryError>,
}

impl TableStatus {
    pub fn is_ready(&self) -> bool {
        self.error.is_none()
    }
}

/// Directory read service shared by every view.
pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
    config: Arc<Config>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DirectoryStore>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    pub fn limits(&self) -> ListingLimits {
        self.config.listing
    }

    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }

    /// Fetch and enrich one page of `R` rows.
    pub async fn fetch_listing<R: DirectoryRecord>(
        &self,
        filter: &ListingFilter,
        scope: Option<Uuid>,
    ) -> Result<ListingPage<R>, DirectoryError> {
        let request = DirectoryQueryBuilder::new(R::TABLE, self.limits())
            .with_scope(scope)
            .build(filter);
        self.execute(&request).await
    }

    /// Run a prepared read request through a full fetch cycle.
    ///
    /// When several reads fail, the primary rows error wins, then the count,
    /// then reference tables in declaration order.
    pub async fn execute<R: DirectoryRecord>(
        &self,
        request: &ReadRequest,
    ) -> Result<ListingPage<R>, DirectoryError> {
        let sources = R::reference_sources();
        let (rows, total, references) = tokio::join!(
            self.store.fetch_rows(request),
            self.store.count_rows(request),
            self.load_references(&sources),
        );
        let rows = rows?;
        let total = total?;
        let references = references?;

        let table = request.table.name();
        let fetched = rows.len();
        let records = decode_rows::<R>(table, rows);
        let enriched = EnrichmentResolver::new(&references).enrich(records);

        debug!(
            table,
            fetched,
            kept = enriched.len(),
            total,
            offset = request.range.start,
            "listing fetched"
        );

        Ok(ListingPage::new(enriched, total, request.range))
    }

    /// Load the given reference tables concurrently.
    pub async fn load_references(
        &self,
        sources: &[ReferenceSource],
    ) -> Result<ReferenceSet, DirectoryError> {
        let loads = sources.iter().map(|&source| async move {
            let request = DirectoryQueryBuilder::reference(source);
            self.store
                .fetch_reference(&request)
                .await
                .map(|rows| ReferenceTable::from_rows(source, rows))
        });

        join_all(loads).await.into_iter().collect()
    }

    /// Alphabetical options of one reference table.
    pub async fn reference_options(
        &self,
        source: ReferenceSource,
    ) -> Result<Vec<ReferenceOption>, DirectoryError> {
        let request = DirectoryQueryBuilder::reference(source);
        let rows = self.store.fetch_reference(&request).await?;
        Ok(ReferenceTable::from_rows(source, rows).options())
    }

    /// Active products most similar to `embedding`, best first.
    pub async fn similar_products(
        &self,
        embedding: &[f32],
        limit: u32,
    ) -> Result<Vec<SimilarProduct>, DirectoryError> {
        let limit = self.limits().clamp(limit);
        let request = DirectoryQueryBuilder::embeddings(self.config.similarity_candidates);
        let rows = self.store.fetch_rows(&request).await?;
        let candidates: Vec<ProductEmbedding> = decode_rows(request.table.name(), rows);

        let ranked = similarity::rank(embedding, &candidates, limit as usize);
        if ranked.is_empty() {
            debug!(candidates = candidates.len(), "no comparable embeddings");
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = ranked.iter().map(|m| m.product_id).collect();
        let lookup = DirectoryQueryBuilder::new(DirectoryTable::Products, self.limits()).lookup(&ids);
        let sources = Product::reference_sources();
        let (rows, references) = tokio::join!(
            self.store.fetch_rows(&lookup),
            self.load_references(&sources),
        );
        let products: Vec<Product> = decode_rows(lookup.table.name(), rows?);
        let references = references?;

        let mut by_id: HashMap<i64, EnrichedRow<Product>> = EnrichmentResolver::new(&references)
            .enrich(products)
            .into_iter()
            .map(|row| (row.record.id, row))
            .collect();

        // Inactive or deleted products drop out here.
        Ok(ranked
            .into_iter()
            .filter_map(|m| {
                by_id.remove(&m.product_id).map(|product| SimilarProduct {
                    score: m.score,
                    product,
                })
            })
            .collect())
    }

    /// Probe every primary and reference table.
    pub async fn probe_tables(&self) -> Vec<TableStatus> {
        let tables = DirectoryTable::ALL
            .iter()
            .map(DirectoryTable::name)
            .chain(ReferenceSource::ALL.iter().map(ReferenceSource::table));

        let probes = tables.map(|table| async move {
            let error = self.store.probe(table).await.err();
            TableStatus { table, error }
        });

        let statuses = join_all(probes).await;
        info!(
            ready = statuses.iter().filter(|s| s.is_ready()).count(),
            total = statuses.len(),
            "directory tables probed"
        );
        statuses
    }

    pub async fn healthy(&self) -> bool {
        self.store.healthy().await
    }
}
