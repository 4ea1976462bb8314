// file: src/models/extraction.rs
// description: per-chunk extraction result and chunk outcome models
// reference: internal data structures

use crate::error::PipelineError;
use crate::models::record::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single field extracted from one chunk, with the confidence the model
/// declared for it (0.5 when the model omitted one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDraft {
    pub value: FieldValue,
    pub confidence: f64,
}

/// Validated extraction output for one (document, chunk) pair. Only fields
/// that passed type validation are present; the raw model response is kept
/// for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub chunk_index: usize,
    pub fields: BTreeMap<String, FieldDraft>,
    pub raw_response: String,
    /// True when every schema field validated on this chunk.
    pub complete: bool,
}

/// Terminal failure of a chunk extraction, flattened for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub kind: String,
    pub detail: String,
}

impl From<&PipelineError> for ChunkFailure {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            detail: err.to_string(),
        }
    }
}

/// What the extraction client hands the aggregator for each chunk: either a
/// (possibly partial) result, a terminal failure, or both when a corrective
/// retry degraded to the valid subset of an earlier response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOutcome {
    pub chunk_index: usize,
    /// Total calls issued to the service for this chunk.
    pub attempts: u32,
    pub result: Option<ExtractionResult>,
    pub failure: Option<ChunkFailure>,
}

impl ChunkOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.result.is_some()
    }
}
