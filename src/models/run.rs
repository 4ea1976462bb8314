// file: src/models/run.rs
// description: run-level state: per-document reports and aggregate counts
// reference: internal data structures

use crate::models::record::{Record, RecordStatus};
use serde::{Deserialize, Serialize};

/// Pipeline stage in which a failure occurred, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scan,
    Read,
    Extract,
    Normalize,
    Chunk,
    Model,
    Aggregate,
    Pipeline,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scan => "scan",
            Stage::Read => "read",
            Stage::Extract => "extract",
            Stage::Normalize => "normalize",
            Stage::Chunk => "chunk",
            Stage::Model => "model",
            Stage::Aggregate => "aggregate",
            Stage::Pipeline => "pipeline",
        }
    }
}

/// One entry of the machine-readable error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub file: String,
    pub stage: Stage,
    pub kind: String,
    pub attempts: u32,
    pub detail: String,
}

/// Everything the run report knows about one input document. Exactly one
/// report exists per input, whatever happened to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub index: usize,
    pub file: String,
    /// SHA-256 of the processed bytes; empty when the file was unreadable.
    pub content_hash: String,
    pub status: RecordStatus,
    pub record: Option<Record>,
    pub error: Option<ErrorEntry>,
    pub pages: usize,
    pub chunks: usize,
    /// Total extraction-service calls across all chunks of this document.
    pub attempts: u32,
    pub duration_ms: u64,
}

impl DocumentReport {
    pub fn failed(index: usize, file: String, error: ErrorEntry) -> Self {
        Self {
            index,
            file,
            content_hash: String::new(),
            status: RecordStatus::Failed,
            record: None,
            error: Some(error),
            pages: 0,
            chunks: 0,
            attempts: 0,
            duration_ms: 0,
        }
    }
}

/// Process-wide state for one batch run, finalized once every document has
/// been processed or the run was cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub documents: Vec<DocumentReport>,
}

impl PipelineRun {
    pub fn count(&self, status: RecordStatus) -> usize {
        self.documents
            .iter()
            .filter(|d| d.status == status)
            .count()
    }

    pub fn complete(&self) -> usize {
        self.count(RecordStatus::Complete)
    }

    pub fn partial(&self) -> usize {
        self.count(RecordStatus::Partial)
    }

    pub fn failed(&self) -> usize {
        self.count(RecordStatus::Failed)
    }

    /// Error log: one entry per failed or partial document that carries one.
    pub fn errors(&self) -> Vec<&ErrorEntry> {
        self.documents
            .iter()
            .filter(|d| d.status != RecordStatus::Complete)
            .filter_map(|d| d.error.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(index: usize, status: RecordStatus) -> DocumentReport {
        DocumentReport {
            index,
            file: format!("doc{}.pdf", index),
            content_hash: String::new(),
            status,
            record: None,
            error: None,
            pages: 1,
            chunks: 1,
            attempts: 1,
            duration_ms: 5,
        }
    }

    #[test]
    fn test_status_counts() {
        let run = PipelineRun {
            run_id: "test".to_string(),
            started_at: String::new(),
            finished_at: String::new(),
            documents: vec![
                report(0, RecordStatus::Complete),
                report(1, RecordStatus::Partial),
                report(2, RecordStatus::Failed),
                report(3, RecordStatus::Complete),
            ],
        };

        assert_eq!(run.complete(), 2);
        assert_eq!(run.partial(), 1);
        assert_eq!(run.failed(), 1);
    }

    #[test]
    fn test_failed_report_constructor() {
        let entry = ErrorEntry {
            file: "locked.pdf".to_string(),
            stage: Stage::Extract,
            kind: "EncryptedDocument".to_string(),
            attempts: 0,
            detail: "password required".to_string(),
        };
        let report = DocumentReport::failed(3, "locked.pdf".to_string(), entry);
        assert_eq!(report.status, RecordStatus::Failed);
        assert!(report.record.is_none());
        assert_eq!(report.error.as_ref().unwrap().kind, "EncryptedDocument");
    }
}
