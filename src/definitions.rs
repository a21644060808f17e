//! Definition paragraphs from the definitions table.
//!
//! Each dictionary entry may have several rows in the definitions table,
//! linked through a reference column whose name is discovered at runtime.
//! The aggregator tries the discovered reference columns in order with one
//! `IN (...)` read each and keeps the first that returns rows.

use std::collections::HashMap;

use ahash::AHashSet;
use log::debug;

use crate::analysis::normalizer::{fold, paragraph};
use crate::config::DefinitionsTableConfig;
use crate::schema::definitions::{DefinitionsProber, DefinitionsSchema, is_content_column};
use crate::store::row::{Row, field_text, normalize_identifier};
use crate::store::{Query, Store, StoreErrorKind};

/// Fetches and deduplicates definition paragraphs per dictionary entry.
#[derive(Debug)]
pub struct DefinitionAggregator {
    prober: DefinitionsProber,
}

impl DefinitionAggregator {
    pub fn new(config: DefinitionsTableConfig, text_hints: Vec<String>) -> Self {
        DefinitionAggregator {
            prober: DefinitionsProber::new(config, text_hints),
        }
    }

    pub fn prober(&self) -> &DefinitionsProber {
        &self.prober
    }

    /// Paragraphs for each entry id, in discovery order and without
    /// near-duplicates. Entries without definitions are absent from the map.
    ///
    /// Ids are compared after trimming and lower-casing. Failures degrade to
    /// an empty map.
    pub async fn fetch<S: Store + ?Sized>(
        &self,
        store: &S,
        entry_ids: &[String],
    ) -> HashMap<String, Vec<String>> {
        let mut unique_ids = Vec::new();
        let mut id_set = AHashSet::new();
        for id in entry_ids {
            let normalized = id.trim().to_lowercase();
            if !normalized.is_empty() && id_set.insert(normalized.clone()) {
                unique_ids.push(normalized);
            }
        }
        if unique_ids.is_empty() {
            return HashMap::new();
        }

        let Some(schema) = self.prober.probe(store).await else {
            return HashMap::new();
        };
        let config = self.prober.config();

        for reference in &schema.reference_columns {
            if self.prober.is_invalid_reference(reference) {
                continue;
            }

            let mut query = Query::table(&config.table)
                .is_in(reference, unique_ids.iter().cloned())
                .limit(config.read_limit);
            if let Some(order) = &schema.order_column
                && order != reference
            {
                query = query.order_by(order, true);
            }

            let rows = match store.select(query).await {
                Ok(rows) => rows,
                Err(error) => {
                    if self.prober.record_failure(Some(reference), &error)
                        == StoreErrorKind::MissingTable
                    {
                        return HashMap::new();
                    }
                    continue;
                }
            };
            if rows.is_empty() {
                continue;
            }

            debug!(
                "Read {} definition rows from '{}' through '{}'",
                rows.len(),
                config.table,
                reference
            );
            return aggregate(&rows, reference, &schema, &id_set);
        }

        HashMap::new()
    }
}

/// Group rows by entry id, keeping the first paragraph of each folded form.
fn aggregate(
    rows: &[Row],
    reference: &str,
    schema: &DefinitionsSchema,
    entry_ids: &AHashSet<String>,
) -> HashMap<String, Vec<String>> {
    let mut paragraphs: HashMap<String, Vec<String>> = HashMap::new();
    let mut seen: AHashSet<(String, String)> = AHashSet::new();

    for row in rows {
        let Some(entry_id) = row.get(reference).and_then(normalize_identifier) else {
            continue;
        };
        if !entry_ids.contains(&entry_id) {
            continue;
        }
        let Some(text) = extract_paragraph(row, schema) else {
            continue;
        };
        let dedup_key = fold(&text);
        if seen.insert((entry_id.clone(), dedup_key)) {
            paragraphs.entry(entry_id).or_default().push(text);
        }
    }

    paragraphs
}

/// The first discovered text column with content, else the first content
/// column that is neither a reference nor the order column.
fn extract_paragraph(row: &Row, schema: &DefinitionsSchema) -> Option<String> {
    let from_text_columns = schema
        .text_columns
        .iter()
        .filter_map(|column| field_text(row, column))
        .map(|text| paragraph(&text))
        .find(|text| !text.is_empty());
    if from_text_columns.is_some() {
        return from_text_columns;
    }

    let references: AHashSet<String> = schema
        .reference_columns
        .iter()
        .map(|column| column.to_lowercase())
        .collect();
    row.keys()
        .filter(|key| !references.contains(&key.to_lowercase()))
        .filter(|key| schema.order_column.as_deref() != Some(key.as_str()))
        .filter(|key| is_content_column(key))
        .find_map(|key| field_text(row, key))
        .map(|text| paragraph(&text))
        .filter(|text| !text.is_empty())
}

/// Merge the definitions of several entry ids, deduplicating across them.
/// Falls back to the meaning itself when nothing was found.
pub fn definitions_for(
    entry_ids: &[String],
    definitions: &HashMap<String, Vec<String>>,
    meaning: &str,
) -> Vec<String> {
    let mut seen = AHashSet::new();
    let merged: Vec<String> = entry_ids
        .iter()
        .filter_map(|id| definitions.get(id))
        .flatten()
        .filter(|text| {
            let key = fold(text);
            !key.is_empty() && seen.insert(key)
        })
        .cloned()
        .collect();
    if !merged.is_empty() {
        return merged;
    }

    let fallback = meaning.trim();
    if fallback.is_empty() {
        Vec::new()
    } else {
        vec![fallback.to_string()]
    }
}
