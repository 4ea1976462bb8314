// file: src/ingest/mod.rs
// description: input discovery module exports
// reference: internal module structure

pub mod scanner;

pub use scanner::{FileScanner, ScannedFile};
