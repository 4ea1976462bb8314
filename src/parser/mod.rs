// file: src/parser/mod.rs
// description: pdf parsing and text preparation module exports
// reference: internal module structure

pub mod chunker;
pub mod normalizer;
pub mod pdf;

pub use chunker::Chunker;
pub use normalizer::TextNormalizer;
pub use pdf::{PageSource, PdfExtractor};
