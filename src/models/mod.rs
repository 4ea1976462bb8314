// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod chunk;
pub mod document;
pub mod extraction;
pub mod page;
pub mod record;
pub mod run;

pub use chunk::TextChunk;
pub use document::{Document, DocumentStatus};
pub use extraction::{ChunkFailure, ChunkOutcome, ExtractionResult, FieldDraft};
pub use page::PageText;
pub use record::{FieldValue, Record, RecordStatus};
pub use run::{DocumentReport, ErrorEntry, PipelineRun, Stage};
