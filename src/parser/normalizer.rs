// file: src/parser/normalizer.rs
// description: Text normalization for model-ready input
// reference: Unicode transliteration via deunicode

use crate::models::PageText;
use deunicode::deunicode;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Word split by line-wrap hyphenation: letter, hyphen, newline, lowercase
    // continuation. Paragraph breaks (double newline) never match.
    static ref WRAP_HYPHEN: Regex = Regex::new(
        r"(?P<head>[A-Za-z])-[ \t]*\n[ \t]*(?P<tail>[a-z])"
    ).expect("WRAP_HYPHEN regex is valid");

    static ref SPACE_RUN: Regex = Regex::new(
        r"[ \t]+"
    ).expect("SPACE_RUN regex is valid");
}

/// Cleans extracted page text into model-ready input.
///
/// Deterministic and idempotent: `normalize(normalize(x)) == normalize(x)`.
/// Never fails; unrecognized input passes through best-effort.
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Whole-document normalization: folds each page, strips headers and
    /// footers that repeat identically on every page, then joins pages with
    /// a single newline so page boundaries never fabricate paragraph breaks.
    pub fn normalize_pages(&self, pages: &[PageText]) -> String {
        let folded: Vec<String> = pages.iter().map(|p| deunicode(&p.text)).collect();
        let stripped = self.strip_repeated_edges(folded);
        self.normalize(&stripped.join("\n"))
    }

    /// Single-text normalization pipeline: Unicode folding, de-hyphenation
    /// across line wraps, whitespace collapse.
    pub fn normalize(&self, text: &str) -> String {
        let folded = deunicode(text);
        let unwrapped = self.rejoin_hyphenation(&folded);
        self.collapse_whitespace(&unwrapped)
    }

    fn rejoin_hyphenation(&self, text: &str) -> String {
        WRAP_HYPHEN.replace_all(text, "$head$tail").into_owned()
    }

    /// Paragraphs (blank-line separated) become single lines with single
    /// spaces; runs of blank lines become one paragraph break.
    fn collapse_whitespace(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");

        let mut paragraphs: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for line in unified.lines() {
            let squeezed = SPACE_RUN.replace_all(line.trim(), " ").into_owned();
            if squeezed.is_empty() {
                if !current.is_empty() {
                    paragraphs.push(current.join(" "));
                    current.clear();
                }
            } else {
                current.push(squeezed);
            }
        }
        if !current.is_empty() {
            paragraphs.push(current.join(" "));
        }

        paragraphs.join("\n\n")
    }

    /// Header/footer heuristic: if the first (or last) non-empty line is
    /// byte-identical on every page of a multi-page document, drop it from
    /// each page. Not guaranteed; varying page furniture is left alone.
    fn strip_repeated_edges(&self, pages: Vec<String>) -> Vec<String> {
        if pages.len() < 2 {
            return pages;
        }

        let header = Self::repeated_edge_line(&pages, true);
        let footer = Self::repeated_edge_line(&pages, false);

        if header.is_none() && footer.is_none() {
            return pages;
        }

        pages
            .into_iter()
            .map(|page| {
                let mut lines: Vec<&str> = page.lines().collect();
                if let Some(ref h) = header
                    && let Some(pos) = lines.iter().position(|l| !l.trim().is_empty())
                    && lines[pos].trim() == h.as_str()
                {
                    lines.remove(pos);
                }
                if let Some(ref f) = footer
                    && let Some(pos) = lines.iter().rposition(|l| !l.trim().is_empty())
                    && lines[pos].trim() == f.as_str()
                {
                    lines.remove(pos);
                }
                lines.join("\n")
            })
            .collect()
    }

    /// The shared first (front) or last (back) non-empty line, if every page
    /// that has text agrees on it and at least two pages carry it.
    fn repeated_edge_line(pages: &[String], front: bool) -> Option<String> {
        let mut shared: Option<&str> = None;
        let mut occurrences = 0;

        for page in pages {
            let edge = if front {
                page.lines().find(|l| !l.trim().is_empty())
            } else {
                page.lines().rev().find(|l| !l.trim().is_empty())
            };

            let Some(line) = edge else { continue };
            let line = line.trim();

            match shared {
                None => shared = Some(line),
                Some(seen) if seen == line => {}
                Some(_) => return None,
            }
            occurrences += 1;
        }

        if occurrences >= 2 {
            shared.map(|s| s.to_string())
        } else {
            None
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
