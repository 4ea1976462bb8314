// file: src/parser/chunker.rs
// description: paragraph-greedy text chunking under a character budget
// reference: internal chunking algorithm

use crate::models::TextChunk;

/// Splits normalized text into bounded chunks for the extraction service.
///
/// Paragraphs (blank-line separated) are accumulated greedily until the next
/// one would exceed the budget. A single paragraph larger than the budget is
/// hard-split at the sentence boundary nearest under the limit, falling back
/// to a word boundary, then to a raw character cut.
///
/// Invariants: no chunk is empty, no chunk exceeds `budget` characters, and
/// concatenating `fresh_text()` over all chunks in index order reconstructs
/// the input exactly.
pub struct Chunker {
    budget: usize,
    overlap: usize,
}

impl Chunker {
    /// `budget` is the maximum chunk size in characters; `overlap` characters
    /// from the tail of each chunk are repeated at the head of the next one
    /// to preserve cross-boundary context. Callers guarantee
    /// `overlap < budget` (config validation).
    pub fn new(budget: usize, overlap: usize) -> Self {
        Self { budget, overlap }
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        // Overlap eats into the budget so the total chunk size stays bounded.
        let fresh_budget = self.budget - self.overlap;

        let mut pieces: Vec<&str> = Vec::new();
        for paragraph in split_keeping_separators(text) {
            if char_len(paragraph) <= fresh_budget {
                pieces.push(paragraph);
            } else {
                split_oversized(paragraph, fresh_budget, &mut pieces);
            }
        }

        let mut chunks: Vec<TextChunk> = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;

        for piece in pieces {
            let piece_chars = char_len(piece);
            if current_chars > 0 && current_chars + piece_chars > fresh_budget {
                self.push_chunk(&mut chunks, std::mem::take(&mut current));
                current_chars = 0;
            }
            current.push_str(piece);
            current_chars += piece_chars;
        }
        if !current.is_empty() {
            self.push_chunk(&mut chunks, current);
        }

        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<TextChunk>, fresh: String) {
        let index = chunks.len();
        if self.overlap == 0 || chunks.is_empty() {
            chunks.push(TextChunk::new(index, fresh, 0));
            return;
        }

        let prev = &chunks[index - 1].text;
        let prefix = tail_chars(prev, self.overlap);
        let overlap_len = char_len(&prefix);
        chunks.push(TextChunk::new(index, format!("{}{}", prefix, fresh), overlap_len));
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`, on char boundaries.
fn tail_chars(s: &str, n: usize) -> String {
    let total = char_len(s);
    if total <= n {
        return s.to_string();
    }
    s.chars().skip(total - n).collect()
}

/// Paragraph spans with their trailing separators attached, tiling the input.
fn split_keeping_separators(text: &str) -> Vec<&str> {
    const SEP: &str = "\n\n";
    let mut spans = Vec::new();
    let mut start = 0;

    while let Some(found) = text[start..].find(SEP) {
        let end = start + found + SEP.len();
        spans.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        spans.push(&text[start..]);
    }
    spans
}

/// Hard-splits one oversized paragraph into pieces of at most `budget`
/// characters, preferring sentence boundaries, then word boundaries.
fn split_oversized<'a>(paragraph: &'a str, budget: usize, pieces: &mut Vec<&'a str>) {
    let mut rest = paragraph;

    while char_len(rest) > budget {
        let window_end = byte_offset_of_char(rest, budget);
        let window = &rest[..window_end];

        let cut = sentence_cut(window)
            .or_else(|| word_cut(window))
            .unwrap_or(window_end);

        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
}

/// Byte offset after `n` characters (or the full length).
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(b, _)| b).unwrap_or(s.len())
}

/// Byte offset just after the last sentence terminator followed by a space
/// inside `window`, if any.
fn sentence_cut(window: &str) -> Option<usize> {
    let mut best = None;
    let bytes = window.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if matches!(bytes[i], b'.' | b'!' | b'?') && bytes[i + 1] == b' ' {
            best = Some(i + 2);
        }
    }
    best.filter(|&cut| cut > 0 && cut < window.len())
}

/// Byte offset after the last space inside `window`, if any.
fn word_cut(window: &str) -> Option<usize> {
    window
        .rfind(' ')
        .map(|i| i + 1)
        .filter(|&cut| cut > 0 && cut < window.len())
}
