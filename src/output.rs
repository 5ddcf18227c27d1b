//! Output Assembler (spec §4.7): turns a batch of mined clusters and the
//! records assigned to them into the two output tables a host persists —
//! the structured log table and the event-template catalog.
//!
//! Grounded directly on the Python `output_result` method
//! (`original_source/.../drain.py`): loads the existing catalog, mints an
//! `EventId` for every cluster not already present by template text,
//! reuses the existing id (and its stale `Occurrences`, see DESIGN.md open
//! question 1) otherwise, then builds the structured rows in one pass.
//! Parameter extraction is optional per call, backed by an `lru::LruCache`
//! of compiled regexes keyed by template text so a recurring template
//! doesn't recompile its capture regex once per member line.

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::drain::Drain;
use crate::error::{DrainError, StoreError};
use crate::params;
use crate::store::{
    EventTemplateRow, EventTemplateTable, LogStore, StructuredLogRow, StructuredLogTable,
};

/// One parsed line plus the cluster Drain assigned it to, as handed over
/// by the Parse Driver after a batch finishes mining.
pub struct MinedRecord {
    pub line_id: usize,
    pub fields: Vec<(String, String)>,
    pub cluster_idx: usize,
}

pub struct OutputAssembler {
    parameter_cache: Option<LruCache<String, regex::Regex>>,
}

impl OutputAssembler {
    /// `parameter_cache_capacity` of `0` disables parameter extraction
    /// entirely; the structured rows then carry `parameter_list: None`.
    pub fn new(parameter_cache_capacity: usize) -> Self {
        let parameter_cache = NonZeroUsize::new(parameter_cache_capacity).map(LruCache::new);
        Self { parameter_cache }
    }

    /// Joins `drain`'s clusters against the existing catalog in
    /// `event_store`, mints ids for new templates, persists the union
    /// catalog, and returns the structured rows for `records`.
    pub fn assemble<S: LogStore<EventTemplateTable>>(
        &mut self,
        records: &[MinedRecord],
        drain: &Drain,
        event_store: &mut S,
    ) -> Result<StructuredLogTable, DrainError> {
        let existing = match event_store.get() {
            Ok(table) => table,
            Err(StoreError::NoSuchLogData) => EventTemplateTable::default(),
            Err(e) => return Err(DrainError::Store(e)),
        };

        let mut event_table = existing.clone();
        let mut next_id = existing.rows.len() + 1;

        // EventId per cluster index, assigned/reused in cluster creation
        // order so a rerun over the same stream is deterministic.
        let mut event_ids = Vec::with_capacity(drain.clusters().len());
        for cluster in drain.clusters() {
            let template = cluster.get_template();
            let event_id = match existing.find_by_template(&template) {
                Some(row) => row.event_id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    event_table.rows.push(EventTemplateRow {
                        event_id: id,
                        event_template: template.clone(),
                        occurrences: cluster.member_ids.len(),
                    });
                    id
                }
            };
            event_ids.push((event_id, template));
        }

        event_store.save(&event_table).map_err(DrainError::Store)?;

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let (event_id, template) = &event_ids[record.cluster_idx];
            let content = record
                .fields
                .iter()
                .find(|(k, _)| k == "Content")
                .map(|(_, v)| v.as_str())
                .unwrap_or("");

            let parameter_list = self.extract_parameters(template, content);

            rows.push(StructuredLogRow {
                line_id: record.line_id,
                fields: record.fields.clone(),
                event_id: *event_id,
                event_template: template.clone(),
                parameter_list,
            });
        }

        Ok(StructuredLogTable { rows })
    }

    fn extract_parameters(&mut self, template: &str, content: &str) -> Option<Vec<String>> {
        let cache = self.parameter_cache.as_mut()?;

        if let Some(regex) = cache.get(template) {
            return Some(params::extract_with(regex, content));
        }
        let regex = params::compile(template)?;
        let values = params::extract_with(&regex, content);
        cache.put(template.to_string(), regex);
        Some(values)
    }
}
