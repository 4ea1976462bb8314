// file: src/schema.rs
// description: extraction schema loaded from yaml with typed field validation
// reference: https://docs.rs/serde_yaml

use crate::error::{PipelineError, Result};
use crate::models::record::FieldValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The set of named, typed fields the pipeline must extract from each
/// document. Field order is preserved from the file and drives column order
/// in the tabular output.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: Option<String>,
    /// Allowed values, enum fields only.
    #[serde(default)]
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Enum,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Enum => "enum",
            FieldType::Date => "date",
        }
    }
}

impl Schema {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read schema {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let schema: Schema = serde_yaml::from_str(raw)
            .map_err(|e| PipelineError::Config(format!("invalid schema: {}", e)))?;
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(PipelineError::Config(
                "schema declares no fields".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(PipelineError::Config(
                    "schema field with empty name".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate schema field: {}",
                    field.name
                )));
            }
            if field.field_type == FieldType::Enum && field.allowed.is_empty() {
                return Err(PipelineError::Config(format!(
                    "enum field {} declares no allowed values",
                    field.name
                )));
            }
        }

        Ok(())
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Starter schema written by `pdfsift schema --init`.
    pub fn template_yaml() -> &'static str {
        "\
# Extraction schema: one entry per field the pipeline should pull out of
# each document. Types: string, number, enum (requires `allowed`), date
# (ISO YYYY-MM-DD).
fields:
  - name: title
    type: string
    description: Full title of the document
  - name: year
    type: number
    description: Publication year
  - name: category
    type: enum
    description: Document category
    allowed: [article, review, report]
  - name: published
    type: date
    description: Publication date
"
    }
}

impl FieldSpec {
    /// Validate a raw model value against this field's declared type.
    /// Strict: a number field rejects a numeric string, the corrective
    /// re-prompt asks the model to fix the type instead.
    pub fn validate_value(
        &self,
        value: &serde_json::Value,
    ) -> std::result::Result<FieldValue, String> {
        match self.field_type {
            FieldType::String => match value {
                serde_json::Value::String(s) if !s.trim().is_empty() => {
                    Ok(FieldValue::Text(s.trim().to_string()))
                }
                serde_json::Value::String(_) => Err("empty string".to_string()),
                other => Err(format!("expected string, got {}", type_name(other))),
            },
            FieldType::Number => match value {
                serde_json::Value::Number(n) => n
                    .as_f64()
                    .map(FieldValue::Number)
                    .ok_or_else(|| "number out of range".to_string()),
                other => Err(format!("expected number, got {}", type_name(other))),
            },
            FieldType::Enum => match value {
                serde_json::Value::String(s) => {
                    let trimmed = s.trim();
                    if self.allowed.iter().any(|a| a == trimmed) {
                        Ok(FieldValue::Text(trimmed.to_string()))
                    } else {
                        Err(format!(
                            "value {:?} not in allowed set [{}]",
                            trimmed,
                            self.allowed.join(", ")
                        ))
                    }
                }
                other => Err(format!("expected enum string, got {}", type_name(other))),
            },
            FieldType::Date => match value {
                serde_json::Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(FieldValue::Date)
                    .map_err(|_| format!("{:?} is not an ISO date (YYYY-MM-DD)", s)),
                other => Err(format!("expected date string, got {}", type_name(other))),
            },
        }
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
