// file: src/pipeline/aggregator.rs
// description: merges per-chunk extraction results into one record per document
// reference: internal merge policy

use crate::models::{ChunkOutcome, FieldDraft, FieldValue, Record, RecordStatus};
use crate::schema::Schema;
use std::collections::BTreeMap;

/// Merge policy, per field: highest declared confidence wins; on a tie the
/// earliest chunk wins (documents front-load summary information); a field no
/// chunk produced is marked `Missing`, never omitted.
///
/// Chunk extractions complete out of order under concurrency, so outcomes are
/// sorted by chunk index first: aggregation is deterministic for any input
/// ordering.
pub struct RecordAggregator;

impl RecordAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, schema: &Schema, outcomes: &[ChunkOutcome]) -> Record {
        let mut sorted: Vec<&ChunkOutcome> = outcomes.iter().collect();
        sorted.sort_by_key(|o| o.chunk_index);

        let any_failure = sorted.iter().any(|o| o.failure.is_some());

        let mut fields = BTreeMap::new();
        let mut provenance = BTreeMap::new();

        for spec in &schema.fields {
            let mut best: Option<(&FieldDraft, usize)> = None;

            for outcome in &sorted {
                let Some(result) = &outcome.result else {
                    continue;
                };
                let Some(draft) = result.fields.get(&spec.name) else {
                    continue;
                };

                // Strictly greater keeps the earliest chunk on ties.
                let better = match best {
                    None => true,
                    Some((current, _)) => draft.confidence > current.confidence,
                };
                if better {
                    best = Some((draft, outcome.chunk_index));
                }
            }

            match best {
                Some((draft, chunk_index)) => {
                    fields.insert(spec.name.clone(), draft.value.clone());
                    provenance.insert(spec.name.clone(), Some(chunk_index));
                }
                None => {
                    fields.insert(spec.name.clone(), FieldValue::Missing);
                    provenance.insert(spec.name.clone(), None);
                }
            }
        }

        let all_present = fields.values().all(|v| !v.is_missing());
        let status = if all_present && !any_failure {
            RecordStatus::Complete
        } else {
            RecordStatus::Partial
        };

        Record {
            fields,
            provenance,
            status,
        }
    }
}

impl Default for RecordAggregator {
    fn default() -> Self {
        Self::new()
    }
}
