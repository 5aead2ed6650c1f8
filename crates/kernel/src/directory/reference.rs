//! Side-loaded reference tables (key → display label).

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::records::RecordKey;
use super::types::ReferenceSource;

/// One selectable option of a reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceOption {
    pub id: RecordKey,
    pub label: String,
}

/// Labels of one reference table, keyed by row id.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    source: ReferenceSource,
    labels: HashMap<RecordKey, String>,
}

impl ReferenceTable {
    pub fn new(source: ReferenceSource) -> Self {
        Self {
            source,
            labels: HashMap::new(),
        }
    }

    /// Build from raw store rows.
    ///
    /// Rows without a usable id or label are skipped. The first occurrence
    /// of a key wins.
    pub fn from_rows(source: ReferenceSource, rows: Vec<Value>) -> Self {
        let mut table = Self::new(source);
        let label_column = source.label_column();

        for row in rows {
            let Some(key) = row
                .get("id")
                .cloned()
                .and_then(|id| serde_json::from_value::<RecordKey>(id).ok())
            else {
                warn!(table = source.table(), "dropping reference row without id");
                continue;
            };

            match row.get(label_column).and_then(Value::as_str) {
                Some(label) => {
                    table.insert(key, label);
                }
                None => {
                    debug!(table = source.table(), %key, "reference row has no label");
                }
            }
        }

        table
    }

    /// Insert a label; returns false when the key was already present.
    pub fn insert(&mut self, key: impl Into<RecordKey>, label: &str) -> bool {
        let key = key.into();
        if self.labels.contains_key(&key) {
            warn!(table = self.source.table(), %key, "duplicate reference key ignored");
            return false;
        }
        self.labels.insert(key, label.to_string());
        true
    }

    pub fn source(&self) -> ReferenceSource {
        self.source
    }

    pub fn label(&self, key: &RecordKey) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All entries sorted alphabetically by label, then id.
    pub fn options(&self) -> Vec<ReferenceOption> {
        let mut options: Vec<ReferenceOption> = self
            .labels
            .iter()
            .map(|(id, label)| ReferenceOption {
                id: id.clone(),
                label: label.clone(),
            })
            .collect();
        options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
        options
    }
}

/// Every reference table loaded for one fetch cycle.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    tables: HashMap<ReferenceSource, ReferenceTable>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: ReferenceTable) {
        self.tables.insert(table.source(), table);
    }

    pub fn get(&self, source: ReferenceSource) -> Option<&ReferenceTable> {
        self.tables.get(&source)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<ReferenceTable> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = ReferenceTable>>(iter: I) -> Self {
        let mut set = Self::new();
        for table in iter {
            set.insert(table);
        }
        set
    }
}
