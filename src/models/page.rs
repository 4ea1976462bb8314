// file: src/models/page.rs
// description: per-page extracted text model
// reference: internal data structures

use serde::{Deserialize, Serialize};

/// Text content of one PDF page. Pages with no extractable text (scanned or
/// image-only) are represented by an empty `PageText`, never skipped, so page
/// indices stay contiguous from 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub index: usize,
    pub text: String,
    pub char_count: usize,
}

impl PageText {
    pub fn new(index: usize, text: String) -> Self {
        let char_count = text.chars().count();
        Self {
            index,
            text,
            char_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_count() {
        let page = PageText::new(0, "héllo".to_string());
        assert_eq!(page.char_count, 5);
        assert!(!page.is_empty());
    }

    #[test]
    fn test_whitespace_only_page_is_empty() {
        let page = PageText::new(2, "  \n ".to_string());
        assert!(page.is_empty());
    }
}
