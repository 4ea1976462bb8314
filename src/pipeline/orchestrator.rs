// file: src/pipeline/orchestrator.rs
// description: coordinates pdf extraction, model calls, and aggregation across a batch
// reference: orchestrates asynchronous extraction workflow

use crate::config::Config;
use crate::error::PipelineError;
use crate::extractor::{CompletionService, ExtractionClient, RateLimiter};
use crate::ingest::ScannedFile;
use crate::models::{
    ChunkFailure, ChunkOutcome, Document, DocumentReport, ErrorEntry, PipelineRun, RecordStatus,
    Stage,
};
use crate::parser::{Chunker, PageSource, PdfExtractor, TextNormalizer};
use crate::pipeline::aggregator::RecordAggregator;
use crate::pipeline::progress::ProgressTracker;
use crate::schema::Schema;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Run-level cancellation signal. Setting it stops new service calls
/// promptly; in-flight calls finish and their results are kept.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a batch of documents through extraction, normalization, chunking,
/// model calls, and aggregation. One document's failure never aborts the
/// batch; the run report names every input exactly once, in input order.
pub struct PipelineOrchestrator {
    config: Config,
    schema: Schema,
    client: Arc<ExtractionClient>,
    pages: Arc<dyn PageSource>,
    normalizer: TextNormalizer,
    chunker: Chunker,
    aggregator: RecordAggregator,
    cancel: CancelFlag,
}

impl PipelineOrchestrator {
    pub fn new(config: Config, schema: Schema, service: Arc<dyn CompletionService>) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.service.requests_per_second,
            config.service.burst,
        ));
        let client = Arc::new(ExtractionClient::new(
            service,
            limiter,
            config.retry.clone(),
            config.service.max_in_flight,
        ));
        let chunker = Chunker::new(
            config.chunking.budget_chars,
            config.chunking.overlap_chars,
        );

        Self {
            config,
            schema,
            client,
            pages: Arc::new(PdfExtractor::new()),
            normalizer: TextNormalizer::new(),
            chunker,
            aggregator: RecordAggregator::new(),
            cancel: CancelFlag::new(),
        }
    }

    /// Swaps the page-text source, mirroring the injectable completion
    /// service: end-to-end tests run against deterministic pages.
    pub fn with_page_source(mut self, pages: Arc<dyn PageSource>) -> Self {
        self.pages = pages;
        self
    }

    /// Handle for stopping the run from another task (signal handler, TUI).
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn run(&self, files: Vec<ScannedFile>) -> PipelineRun {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now().to_rfc3339();
        info!(
            "Starting extraction run {} over {} document(s), {} parallel",
            run_id,
            files.len(),
            self.config.pipeline.parallel_documents
        );

        let progress = Arc::new(ProgressTracker::new(files.len()));

        let mut reports: Vec<DocumentReport> = stream::iter(
            files.iter().enumerate().map(|(index, file)| {
                let progress = Arc::clone(&progress);
                async move {
                    progress.set_message(file.relative_path.clone());
                    let report = self.process_document(index, file).await;

                    match report.status {
                        RecordStatus::Complete => progress.inc_complete(),
                        RecordStatus::Partial => progress.inc_partial(),
                        RecordStatus::Failed => progress.inc_failed(),
                    }
                    progress.add_chunks(report.chunks);
                    progress.add_service_calls(report.attempts);

                    report
                }
            }),
        )
        .buffer_unordered(self.config.pipeline.parallel_documents.max(1))
        .collect()
        .await;

        // Completion order is arbitrary; output order is input order.
        reports.sort_by_key(|r| r.index);

        progress.finish();
        let stats = progress.get_stats();
        info!(
            "Run {} finished: {} complete, {} partial, {} failed, {} service call(s)",
            run_id,
            stats.documents_complete,
            stats.documents_partial,
            stats.documents_failed,
            stats.service_calls
        );

        PipelineRun {
            run_id,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            documents: reports,
        }
    }

    async fn process_document(&self, index: usize, file: &ScannedFile) -> DocumentReport {
        let start = Instant::now();
        let timeout = Duration::from_secs(self.config.pipeline.document_timeout_secs);

        let outcome = tokio::time::timeout(timeout, self.process_inner(index, file)).await;

        let mut report = match outcome {
            Ok(Ok(report)) => report,
            Ok(Err((stage, err))) => {
                warn!("Document {} failed at {}: {}", file.relative_path, stage.as_str(), err);
                DocumentReport::failed(
                    index,
                    file.relative_path.clone(),
                    ErrorEntry {
                        file: file.relative_path.clone(),
                        stage,
                        kind: err.kind().to_string(),
                        attempts: 0,
                        detail: err.to_string(),
                    },
                )
            }
            Err(_) => {
                let err = PipelineError::DocumentTimeout(self.config.pipeline.document_timeout_secs);
                warn!("Document {} timed out", file.relative_path);
                DocumentReport::failed(
                    index,
                    file.relative_path.clone(),
                    ErrorEntry {
                        file: file.relative_path.clone(),
                        stage: Stage::Pipeline,
                        kind: err.kind().to_string(),
                        attempts: 0,
                        detail: err.to_string(),
                    },
                )
            }
        };

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    async fn process_inner(
        &self,
        index: usize,
        file: &ScannedFile,
    ) -> Result<DocumentReport, (Stage, PipelineError)> {
        if self.cancel.is_cancelled() {
            return Err((Stage::Pipeline, PipelineError::Cancelled));
        }

        let bytes = tokio::fs::read(&file.path).await.map_err(|source| {
            (
                Stage::Read,
                PipelineError::FileOperation {
                    path: file.path.clone(),
                    source,
                },
            )
        })?;

        let mut document = Document::new(
            file.path.display().to_string(),
            file.relative_path.clone(),
            &bytes,
        );

        // PDF parsing is CPU-bound; keep it off the async workers.
        let source = Arc::clone(&self.pages);
        let pages = tokio::task::spawn_blocking(move || source.extract_pages(&bytes))
            .await
            .map_err(|e| {
                (
                    Stage::Extract,
                    PipelineError::CorruptDocument(format!("extraction task panicked: {}", e)),
                )
            })?
            .map_err(|e| (Stage::Extract, e))?;
        document.mark_extracted(pages.len());

        let text = self.normalizer.normalize_pages(&pages);
        if text.is_empty() {
            return Err((Stage::Normalize, PipelineError::EmptyDocument));
        }

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err((Stage::Chunk, PipelineError::EmptyDocument));
        }

        let outcomes: Vec<ChunkOutcome> = stream::iter(chunks.iter().map(|chunk| {
            let client = Arc::clone(&self.client);
            let cancel = self.cancel.clone();
            let schema = &self.schema;
            async move {
                if cancel.is_cancelled() {
                    return ChunkOutcome {
                        chunk_index: chunk.index,
                        attempts: 0,
                        result: None,
                        failure: Some(ChunkFailure {
                            kind: PipelineError::Cancelled.kind().to_string(),
                            detail: PipelineError::Cancelled.to_string(),
                        }),
                    };
                }
                client.extract_chunk(chunk, schema).await
            }
        }))
        .buffer_unordered(self.config.service.max_in_flight.max(1))
        .collect()
        .await;

        let attempts: u32 = outcomes.iter().map(|o| o.attempts).sum();
        let record = self.aggregator.aggregate(&self.schema, &outcomes);
        let status = record.status;

        let error = match status {
            RecordStatus::Complete => None,
            _ => Some(self.partial_error_entry(file, &outcomes, &record, attempts)),
        };

        Ok(DocumentReport {
            index,
            file: file.relative_path.clone(),
            content_hash: document.content_hash.clone(),
            status,
            record: Some(record),
            error,
            pages: document.page_count,
            chunks: chunks.len(),
            attempts,
            duration_ms: 0,
        })
    }

    /// Error-log entry for a document that ended Partial: the first chunk
    /// failure if there was one, otherwise the missing-field list.
    fn partial_error_entry(
        &self,
        file: &ScannedFile,
        outcomes: &[ChunkOutcome],
        record: &crate::models::Record,
        attempts: u32,
    ) -> ErrorEntry {
        let mut sorted: Vec<&ChunkOutcome> = outcomes.iter().collect();
        sorted.sort_by_key(|o| o.chunk_index);

        if let Some(failure) = sorted.iter().find_map(|o| o.failure.as_ref()) {
            return ErrorEntry {
                file: file.relative_path.clone(),
                stage: Stage::Model,
                kind: failure.kind.clone(),
                attempts,
                detail: failure.detail.clone(),
            };
        }

        ErrorEntry {
            file: file.relative_path.clone(),
            stage: Stage::Aggregate,
            kind: "MissingFields".to_string(),
            attempts,
            detail: format!(
                "no chunk yielded: {}",
                record.missing_fields().join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Result;
    use crate::extractor::CompletionRequest;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct NeverCalled;

    #[async_trait]
    impl CompletionService for NeverCalled {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            panic!("service must not be called");
        }
    }

    fn test_schema() -> Schema {
        Schema::from_yaml_str("fields:\n  - name: title\n    type: string\n").unwrap()
    }

    fn orchestrator() -> PipelineOrchestrator {
        PipelineOrchestrator::new(Config::default_config(), test_schema(), Arc::new(NeverCalled))
    }

    fn scanned(path: &str) -> ScannedFile {
        ScannedFile {
            path: PathBuf::from(path),
            relative_path: path.to_string(),
            size: 0,
        }
    }

    #[tokio::test]
    async fn test_missing_file_reported_failed_at_read_stage() {
        let orchestrator = orchestrator();
        let run = orchestrator
            .run(vec![scanned("/nonexistent/void.pdf")])
            .await;

        assert_eq!(run.documents.len(), 1);
        let report = &run.documents[0];
        assert_eq!(report.status, RecordStatus::Failed);
        let error = report.error.as_ref().unwrap();
        assert_eq!(error.stage, Stage::Read);
        assert_eq!(error.kind, "FileOperation");
    }

    #[tokio::test]
    async fn test_cancelled_run_reports_every_document() {
        let orchestrator = orchestrator();
        orchestrator.cancel_flag().cancel();

        let run = orchestrator
            .run(vec![scanned("a.pdf"), scanned("b.pdf"), scanned("c.pdf")])
            .await;

        assert_eq!(run.documents.len(), 3);
        for (i, report) in run.documents.iter().enumerate() {
            assert_eq!(report.index, i);
            assert_eq!(report.status, RecordStatus::Failed);
            assert_eq!(report.error.as_ref().unwrap().kind, "Cancelled");
        }
    }

    #[tokio::test]
    async fn test_reports_come_back_in_input_order() {
        let orchestrator = orchestrator();
        let run = orchestrator
            .run(vec![
                scanned("/missing/z.pdf"),
                scanned("/missing/a.pdf"),
                scanned("/missing/m.pdf"),
            ])
            .await;

        let files: Vec<&str> = run.documents.iter().map(|d| d.file.as_str()).collect();
        assert_eq!(files, vec!["/missing/z.pdf", "/missing/a.pdf", "/missing/m.pdf"]);
    }
}
