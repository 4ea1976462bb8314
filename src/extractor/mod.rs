// file: src/extractor/mod.rs
// description: model-backed extraction module exports
// reference: internal module structure

pub mod client;
pub mod limiter;
pub mod prompt;
pub mod response;
pub mod service;

pub use client::ExtractionClient;
pub use limiter::RateLimiter;
pub use prompt::PromptBuilder;
pub use response::{ParsedResponse, parse_response};
pub use service::{CompletionRequest, CompletionService, HttpCompletionService};
