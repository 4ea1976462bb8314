// file: src/models/chunk.rs
// description: bounded text chunk model with overlap accounting
// reference: internal data structures

use serde::{Deserialize, Serialize};

/// One bounded-size slice of a document's normalized text, submitted as a
/// single unit to the extraction service.
///
/// `overlap_len` counts the leading characters repeated from the tail of the
/// previous chunk. Invariant: concatenating `fresh_text()` of all chunks in
/// index order reconstructs the normalized document text exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub overlap_len: usize,
}

impl TextChunk {
    pub fn new(index: usize, text: String, overlap_len: usize) -> Self {
        Self {
            index,
            text,
            overlap_len,
        }
    }

    /// Characters in this chunk, overlap prefix included.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// The non-overlapping portion of the chunk.
    pub fn fresh_text(&self) -> &str {
        if self.overlap_len == 0 {
            return &self.text;
        }
        match self.text.char_indices().nth(self.overlap_len) {
            Some((byte_offset, _)) => &self.text[byte_offset..],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_text_skips_overlap_prefix() {
        let chunk = TextChunk::new(1, "tail of previous. new content".to_string(), 18);
        assert_eq!(chunk.fresh_text(), "new content");
    }

    #[test]
    fn test_fresh_text_without_overlap() {
        let chunk = TextChunk::new(0, "whole chunk".to_string(), 0);
        assert_eq!(chunk.fresh_text(), "whole chunk");
    }

    #[test]
    fn test_fresh_text_is_char_aware() {
        let chunk = TextChunk::new(1, "héé rest".to_string(), 4);
        assert_eq!(chunk.fresh_text(), "rest");
    }
}
