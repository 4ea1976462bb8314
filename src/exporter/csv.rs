// file: src/exporter/csv.rs
// description: tabular csv export of extraction records
// reference: https://docs.rs/csv

use crate::error::{PipelineError, Result};
use crate::models::{PipelineRun, Record};
use crate::schema::Schema;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Writes the final table: one row per input document in input order, one
/// column per schema field in declared order, plus status and provenance.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_path: PathBuf,
}

impl CsvExporter {
    pub fn new(output_path: impl Into<PathBuf>) -> Result<Self> {
        let output_path = output_path.into();
        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { output_path })
    }

    pub fn export(&self, run: &PipelineRun, schema: &Schema) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.output_path)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        let mut header = vec!["file".to_string(), "status".to_string()];
        header.extend(schema.fields.iter().map(|f| f.name.clone()));
        header.push("provenance".to_string());
        writer
            .write_record(&header)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        for document in &run.documents {
            let mut row = vec![document.file.clone(), document.status.as_str().to_string()];

            match &document.record {
                Some(record) => {
                    for field in &schema.fields {
                        row.push(
                            record
                                .value(&field.name)
                                .map(|v| v.to_cell())
                                .unwrap_or_default(),
                        );
                    }
                    row.push(provenance_cell(record, schema));
                }
                None => {
                    for _ in 0..=schema.fields.len() {
                        row.push(String::new());
                    }
                }
            }

            writer
                .write_record(&row)
                .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        }

        writer.flush()?;
        info!(
            "Wrote {} row(s) to {}",
            run.documents.len(),
            self.output_path.display()
        );
        Ok(())
    }
}

/// `field=chunk` pairs for every field a chunk contributed, in schema order.
fn provenance_cell(record: &Record, schema: &Schema) -> String {
    schema
        .fields
        .iter()
        .filter_map(|f| {
            record
                .provenance
                .get(&f.name)
                .and_then(|origin| *origin)
                .map(|chunk| format!("{}={}", f.name, chunk))
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentReport, ErrorEntry, FieldValue, RecordStatus, Stage};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema::from_yaml_str(
            "fields:\n  - name: name\n    type: string\n  - name: age\n    type: number\n",
        )
        .unwrap()
    }

    fn run_with_rows() -> PipelineRun {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldValue::Text("Bee".to_string()));
        fields.insert("age".to_string(), FieldValue::Number(3.0));
        let mut provenance = BTreeMap::new();
        provenance.insert("name".to_string(), Some(0));
        provenance.insert("age".to_string(), Some(2));

        let complete = DocumentReport {
            index: 0,
            file: "a.pdf".to_string(),
            content_hash: "abc123".to_string(),
            status: RecordStatus::Complete,
            record: Some(Record {
                fields,
                provenance,
                status: RecordStatus::Complete,
            }),
            error: None,
            pages: 1,
            chunks: 3,
            attempts: 3,
            duration_ms: 10,
        };

        let failed = DocumentReport::failed(
            1,
            "b.pdf".to_string(),
            ErrorEntry {
                file: "b.pdf".to_string(),
                stage: Stage::Extract,
                kind: "EncryptedDocument".to_string(),
                attempts: 0,
                detail: "password required".to_string(),
            },
        );

        PipelineRun {
            run_id: "test".to_string(),
            started_at: String::new(),
            finished_at: String::new(),
            documents: vec![complete, failed],
        }
    }

    #[test]
    fn test_header_follows_schema_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");
        let exporter = CsvExporter::new(&path).unwrap();

        exporter.export(&run_with_rows(), &schema()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, "file,status,name,age,provenance");
    }

    #[test]
    fn test_one_row_per_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");
        let exporter = CsvExporter::new(&path).unwrap();

        exporter.export(&run_with_rows(), &schema()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "a.pdf,Complete,Bee,3,name=0;age=2");
        assert_eq!(lines[2], "b.pdf,Failed,,,");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/records.csv");
        let exporter = CsvExporter::new(&path).unwrap();
        exporter.export(&run_with_rows(), &schema()).unwrap();
        assert!(path.exists());
    }
}
