// file: src/models/document.rs
// description: core document model with validation and serialization
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Pending,
    Extracted,
    Failed,
}

/// One input PDF. Identity is the source path; the content hash ties report
/// rows back to the exact bytes that were processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub file_path: String,
    pub relative_path: String,
    pub content_hash: String,
    pub file_size: u64,
    pub page_count: usize,
    pub status: DocumentStatus,
}

impl Document {
    pub fn new(file_path: String, relative_path: String, bytes: &[u8]) -> Self {
        let content_hash = Self::compute_hash(bytes);

        Self {
            file_path,
            relative_path,
            content_hash,
            file_size: bytes.len() as u64,
            page_count: 0,
            status: DocumentStatus::Pending,
        }
    }

    fn compute_hash(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    pub fn mark_extracted(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.status = DocumentStatus::Extracted;
    }

    pub fn mark_failed(&mut self) {
        self.status = DocumentStatus::Failed;
    }
}
