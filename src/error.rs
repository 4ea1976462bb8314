// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("Encrypted document: password required")]
    EncryptedDocument,

    #[error("Empty document: no extractable pages")]
    EmptyDocument,

    #[error("Rate limited by extraction service")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Transient service error: {0}")]
    TransientService(String),

    #[error("Service rejected request with status {status}: {detail}")]
    Service { status: u16, detail: String },

    #[error("Response violates extraction schema: {0}")]
    SchemaViolation(String),

    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    #[error("Document processing exceeded {0} seconds")]
    DocumentTimeout(u64),

    #[error("Run cancelled")]
    Cancelled,

    #[error("File operation failed for {}: {}", .path.display(), .source)]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Stable label used in the run report and error log.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "ConfigurationError",
            PipelineError::CorruptDocument(_) => "CorruptDocument",
            PipelineError::EncryptedDocument => "EncryptedDocument",
            PipelineError::EmptyDocument => "EmptyDocument",
            PipelineError::RateLimited { .. } => "RateLimited",
            PipelineError::TransientService(_) => "TransientServiceError",
            PipelineError::Service { .. } => "ServiceError",
            PipelineError::SchemaViolation(_) => "SchemaViolation",
            PipelineError::InvalidResponse(_) => "InvalidResponse",
            PipelineError::DocumentTimeout(_) => "DocumentTimeout",
            PipelineError::Cancelled => "Cancelled",
            PipelineError::FileOperation { .. } => "FileOperation",
            PipelineError::Io(_) => "IoError",
            PipelineError::Serialization(_) => "SerializationError",
        }
    }

    /// Errors worth another attempt after exponential backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::RateLimited { .. } | PipelineError::TransientService(_)
        )
    }

    /// Content-shape errors: retried once with a corrective re-prompt,
    /// never with a backoff loop.
    pub fn is_content_shape(&self) -> bool {
        matches!(
            self,
            PipelineError::SchemaViolation(_) | PipelineError::InvalidResponse(_)
        )
    }
}
