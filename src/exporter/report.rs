// file: src/exporter/report.rs
// description: machine-readable json run report
// reference: internal report contract

use crate::error::{PipelineError, Result};
use crate::models::{DocumentReport, ErrorEntry, PipelineRun};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    run_id: &'a str,
    started_at: &'a str,
    finished_at: &'a str,
    total: usize,
    complete: usize,
    partial: usize,
    failed: usize,
    errors: Vec<&'a ErrorEntry>,
    documents: &'a [DocumentReport],
}

/// Writes the status report: aggregate counts, the error log (one entry per
/// failed or partial document), and the full per-document detail.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_path: PathBuf,
}

impl ReportWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Result<Self> {
        let output_path = output_path.into();
        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { output_path })
    }

    pub fn write(&self, run: &PipelineRun) -> Result<()> {
        let summary = RunSummary {
            run_id: &run.run_id,
            started_at: &run.started_at,
            finished_at: &run.finished_at,
            total: run.documents.len(),
            complete: run.complete(),
            partial: run.partial(),
            failed: run.failed(),
            errors: run.errors(),
            documents: &run.documents,
        };

        let payload = serde_json::to_string_pretty(&summary)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        fs::write(&self.output_path, payload)?;

        info!("Wrote run report to {}", self.output_path.display());
        Ok(())
    }
}
