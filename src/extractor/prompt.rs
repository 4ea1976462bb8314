// file: src/extractor/prompt.rs
// description: prompt construction for schema-guided extraction
// reference: prompt text kept separate from retry and transport logic

use crate::models::TextChunk;
use crate::schema::{FieldType, Schema};

/// Builds the three prompt shapes the client sends: the schema-describing
/// system prompt, the per-chunk user message, and the corrective follow-up
/// after a malformed or type-violating response.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn system(schema: &Schema) -> String {
        let mut out = String::from(
            "You extract structured data from document excerpts.\n\
             Extract the fields listed below. Respond with a single JSON object and no prose.\n\
             For every field respond with:\n\
             \"<field>\": {\"value\": <typed value>, \"confidence\": <number 0..1>}\n\
             Use {\"value\": null, \"confidence\": 0} when the excerpt does not contain the field.\n\
             Types: string fields take JSON strings, number fields take JSON numbers \
             (never quoted), date fields take ISO strings \"YYYY-MM-DD\", enum fields \
             take exactly one of their allowed values.\n\nFields:\n",
        );

        for field in &schema.fields {
            out.push_str(&format!("- {} ({})", field.name, field.field_type.as_str()));
            if field.field_type == FieldType::Enum {
                out.push_str(&format!(" [allowed: {}]", field.allowed.join(", ")));
            }
            if let Some(ref description) = field.description {
                out.push_str(&format!(": {}", description));
            }
            out.push('\n');
        }

        out
    }

    pub fn user(chunk: &TextChunk) -> String {
        format!(
            "Document excerpt (part {}):\n\n{}",
            chunk.index + 1,
            chunk.text
        )
    }

    /// Re-prompt after a response that could not be used as-is. Names the
    /// concrete problems so the model can fix types rather than guess.
    pub fn corrective(chunk: &TextChunk, previous_response: &str, problems: &[String]) -> String {
        format!(
            "Your previous response could not be accepted.\n\
             Problems:\n{}\n\n\
             Previous response:\n{}\n\n\
             Return the corrected JSON object only, with every field in the required \
             {{\"value\": ..., \"confidence\": ...}} shape.\n\n\
             Document excerpt (part {}):\n\n{}",
            problems
                .iter()
                .map(|p| format!("- {}", p))
                .collect::<Vec<_>>()
                .join("\n"),
            previous_response,
            chunk.index + 1,
            chunk.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::from_yaml_str(
            "fields:\n  - name: name\n    type: string\n    description: Subject name\n  - name: status\n    type: enum\n    allowed: [active, dormant]\n",
        )
        .unwrap()
    }

    #[test]
    fn test_system_prompt_lists_fields_and_types() {
        let prompt = PromptBuilder::system(&schema());
        assert!(prompt.contains("- name (string): Subject name"));
        assert!(prompt.contains("- status (enum) [allowed: active, dormant]"));
    }

    #[test]
    fn test_user_prompt_carries_chunk_text() {
        let chunk = TextChunk::new(2, "the excerpt".to_string(), 0);
        let prompt = PromptBuilder::user(&chunk);
        assert!(prompt.contains("part 3"));
        assert!(prompt.contains("the excerpt"));
    }

    #[test]
    fn test_corrective_prompt_names_problems() {
        let chunk = TextChunk::new(0, "the excerpt".to_string(), 0);
        let prompt = PromptBuilder::corrective(
            &chunk,
            "{\"age\": \"3\"}",
            &["field age: expected number, got string".to_string()],
        );
        assert!(prompt.contains("expected number, got string"));
        assert!(prompt.contains("{\"age\": \"3\"}"));
        assert!(prompt.contains("the excerpt"));
    }
}
