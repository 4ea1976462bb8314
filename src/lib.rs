// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod utils;

pub use config::{
    ChunkingConfig, Config, InputConfig, OutputConfig, PipelineConfig, RetryConfig, ServiceConfig,
};
pub use error::{PipelineError, Result};
pub use exporter::{CsvExporter, ReportWriter};
pub use extractor::{
    CompletionRequest, CompletionService, ExtractionClient, HttpCompletionService, PromptBuilder,
    RateLimiter,
};
pub use ingest::{FileScanner, ScannedFile};
pub use models::{
    ChunkOutcome, Document, DocumentReport, DocumentStatus, ErrorEntry, ExtractionResult,
    FieldValue, PageText, PipelineRun, Record, RecordStatus, Stage, TextChunk,
};
pub use parser::{Chunker, PageSource, PdfExtractor, TextNormalizer};
pub use pipeline::{
    CancelFlag, PipelineOrchestrator, PipelineStats, ProgressTracker, RecordAggregator,
};
pub use schema::{FieldSpec, FieldType, Schema};
pub use utils::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _config = Config::default_config();
        let _normalizer = TextNormalizer::new();
        let _chunker = Chunker::new(1000, 0);
    }
}
