// file: src/extractor/response.rs
// description: model response parsing and schema validation
// reference: internal response contract, see extractor::prompt

use crate::error::{PipelineError, Result};
use crate::models::FieldDraft;
use crate::schema::Schema;
use std::collections::BTreeMap;

/// Confidence assumed when the model omits one. Low enough that any declared
/// confidence on another chunk wins, while ties still resolve by chunk order.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Outcome of validating one raw model response against the schema.
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// Fields that passed type validation.
    pub fields: BTreeMap<String, FieldDraft>,
    /// Human-readable problems for fields that were present but invalid.
    pub problems: Vec<String>,
}

impl ParsedResponse {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Parses a raw completion into validated fields.
///
/// Errors: `InvalidResponse` when the payload is not a JSON object at all,
/// `SchemaViolation` when it parses but not a single field validates.
/// Partially valid responses return `Ok` with the problem list filled in so
/// the client can decide on a corrective re-prompt.
pub fn parse_response(raw: &str, schema: &Schema) -> Result<ParsedResponse> {
    let stripped = strip_code_fences(raw);

    let value: serde_json::Value = serde_json::from_str(stripped)
        .map_err(|e| PipelineError::InvalidResponse(format!("response is not JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| PipelineError::InvalidResponse("response is not a JSON object".to_string()))?;

    let mut fields = BTreeMap::new();
    let mut problems = Vec::new();

    for spec in &schema.fields {
        let Some(entry) = object.get(&spec.name) else {
            continue;
        };
        if entry.is_null() {
            continue;
        }

        // Accept both the requested {"value", "confidence"} envelope and a
        // bare value; models drift between the two.
        let (value_node, confidence) = match entry.as_object() {
            Some(envelope) if envelope.contains_key("value") => {
                let confidence = envelope
                    .get("confidence")
                    .and_then(|c| c.as_f64())
                    .unwrap_or(DEFAULT_CONFIDENCE)
                    .clamp(0.0, 1.0);
                (&envelope["value"], confidence)
            }
            _ => (entry, DEFAULT_CONFIDENCE),
        };

        if value_node.is_null() {
            continue;
        }

        match spec.validate_value(value_node) {
            Ok(value) => {
                fields.insert(spec.name.clone(), FieldDraft { value, confidence });
            }
            Err(reason) => problems.push(format!("field {}: {}", spec.name, reason)),
        }
    }

    if fields.is_empty() && !problems.is_empty() {
        return Err(PipelineError::SchemaViolation(problems.join("; ")));
    }

    Ok(ParsedResponse { fields, problems })
}

/// Strips a surrounding markdown code fence; models add them even when asked
/// for raw JSON.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
