// file: src/parser/pdf.rs
// description: PDF page-text extraction with corrupt/encrypted/empty detection
// reference: https://docs.rs/pdf-extract

use crate::error::{PipelineError, Result};
use crate::models::PageText;
use tracing::debug;

/// Boundary the pipeline reads page text through. Production uses
/// [`PdfExtractor`]; tests inject deterministic sources the same way the
/// completion service is stubbed.
pub trait PageSource: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>>;
}

/// Pure transform from PDF bytes to an ordered page-text sequence.
///
/// Structural checks run through lopdf (cheap, no content decoding) before
/// pdf-extract walks the content streams. Pages without a text layer come
/// back as empty `PageText`s rather than failing the document; scanned or
/// image-only pages are normal input.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>> {
        let document = match lopdf::Document::load_mem(bytes) {
            Ok(document) => document,
            Err(err) => {
                let detail = err.to_string();
                let lowered = detail.to_lowercase();
                if lowered.contains("crypt") || lowered.contains("password") {
                    return Err(PipelineError::EncryptedDocument);
                }
                return Err(PipelineError::CorruptDocument(detail));
            }
        };

        if document.is_encrypted() {
            return Err(PipelineError::EncryptedDocument);
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PipelineError::EmptyDocument);
        }

        let page_texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| PipelineError::CorruptDocument(e.to_string()))?;

        debug!(
            "Extracted text from {} of {} pages",
            page_texts.len(),
            page_count
        );

        // Keep page indices contiguous with the page table even when the
        // content walker yields fewer entries.
        let mut pages: Vec<PageText> = page_texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| PageText::new(index, text))
            .collect();

        while pages.len() < page_count {
            pages.push(PageText::new(pages.len(), String::new()));
        }

        Ok(pages)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>> {
        self.extract(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid single-page PDF carrying `text` in its content stream.
    /// Body first, then an xref table with correct byte offsets.
    pub fn minimal_pdf(text: &str) -> Vec<u8> {
        let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let o1 = out.len();
        out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
        let o2 = out.len();
        out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
        let o3 = out.len();
        out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
        let o4 = out.len();
        out.extend_from_slice(
            format!(
                "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                stream.len(),
                stream
            )
            .as_bytes(),
        );
        let o5 = out.len();
        out.extend_from_slice(
            b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
        );
        let xref_start = out.len();
        out.extend_from_slice(b"xref\n0 6\n");
        out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
        for offset in [o1, o2, o3, o4, o5] {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
        out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
        out.extend_from_slice(b"%%EOF\n");
        out
    }

    #[test]
    fn test_extracts_single_page() {
        let extractor = PdfExtractor::new();
        let pages = extractor.extract(&minimal_pdf("hello extraction")).unwrap();

        // Text recovery from synthetic PDFs varies with font handling; the
        // structural guarantees are page count and contiguous indices.
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].index, 0);
    }

    #[test]
    fn test_garbage_bytes_are_corrupt() {
        let extractor = PdfExtractor::new();
        let err = extractor.extract(b"not a pdf at all").unwrap_err();
        assert_eq!(err.kind(), "CorruptDocument");
    }

    #[test]
    fn test_truncated_pdf_is_corrupt() {
        let extractor = PdfExtractor::new();
        let mut bytes = minimal_pdf("cut short");
        bytes.truncate(40);
        let err = extractor.extract(&bytes).unwrap_err();
        assert_eq!(err.kind(), "CorruptDocument");
    }
}
