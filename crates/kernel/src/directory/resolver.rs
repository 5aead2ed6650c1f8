//! Join/enrichment resolver.
//!
//! Attaches reference labels to primary rows. Enrichment is total: every
//! declared foreign key gets a label or its fallback, no row is dropped, and
//! nothing is fetched here.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::records::DirectoryRecord;
use super::reference::ReferenceSet;

/// A primary record plus one label per declared foreign key.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRow<R> {
    #[serde(flatten)]
    pub record: R,

    #[serde(flatten)]
    pub names: BTreeMap<&'static str, String>,
}

impl<R> EnrichedRow<R> {
    /// Label attached under `name_field` (e.g. `market_name`).
    pub fn name(&self, name_field: &str) -> Option<&str> {
        self.names.get(name_field).map(String::as_str)
    }
}

/// Resolves foreign keys against a fully loaded [`ReferenceSet`].
pub struct EnrichmentResolver<'a> {
    references: &'a ReferenceSet,
}

impl<'a> EnrichmentResolver<'a> {
    pub fn new(references: &'a ReferenceSet) -> Self {
        Self { references }
    }

    pub fn enrich<R: DirectoryRecord>(&self, rows: Vec<R>) -> Vec<EnrichedRow<R>> {
        for fk in R::FOREIGN_KEYS {
            if self.references.get(fk.source).is_none() {
                warn!(
                    table = fk.source.table(),
                    field = fk.field,
                    "reference table not loaded; using fallback labels"
                );
            }
        }

        rows.into_iter().map(|row| self.enrich_row(row)).collect()
    }

    pub fn enrich_row<R: DirectoryRecord>(&self, record: R) -> EnrichedRow<R> {
        let names = R::FOREIGN_KEYS
            .iter()
            .map(|fk| {
                let label = record
                    .foreign_key(fk.field)
                    .and_then(|key| {
                        self.references
                            .get(fk.source)
                            .and_then(|table| table.label(&key))
                    })
                    .unwrap_or(fk.fallback);
                (fk.name_field, label.to_string())
            })
            .collect();

        EnrichedRow { record, names }
    }
}
