//! PDF loading and page-range text extraction.

use crate::error::{InputError, PipelineError, Result};
use crate::text::normalize_text;
use std::ops::Range;
use std::path::Path;

/// A loaded document: one optional text per page, in page order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pages: Vec<Option<String>>,
}

impl Document {
    /// Build a document from already-extracted page texts.
    pub fn from_pages(pages: Vec<Option<String>>) -> Self {
        Self { pages }
    }

    /// Load a PDF and pull the text out of every page.
    ///
    /// A page whose content cannot be decoded contributes no text.
    pub fn open(path: &Path) -> Result<Self> {
        let pdf = lopdf::Document::load(path)
            .map_err(|e| PipelineError::Extraction(format!("{}: {}", path.display(), e)))?;

        let mut pages = Vec::new();
        for page_number in pdf.get_pages().keys() {
            let text = match pdf.extract_text(&[*page_number]) {
                Ok(text) if !text.is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("Skipping page {}: {}", page_number, e);
                    None
                }
            };
            pages.push(text);
        }

        log::debug!("Loaded {} pages from {}", pages.len(), path.display());
        Ok(Self::from_pages(pages))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of a zero-based page, if it had any.
    pub fn page_text(&self, index: usize) -> Option<&str> {
        self.pages.get(index).and_then(|p| p.as_deref())
    }
}

/// A parsed "start-end" page range: 1-based, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: usize,
    pub last: usize,
}

impl PageRange {
    /// Parse a range string. Blank input means "all pages".
    pub fn parse(spec: Option<&str>) -> std::result::Result<Option<Self>, InputError> {
        let spec = match spec.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(s) => s,
        };

        let invalid = || InputError::InvalidRange(spec.to_string());

        let parts: Vec<&str> = spec.split('-').collect();
        if parts.len() != 2 {
            return Err(invalid());
        }

        let first: usize = parts[0].trim().parse().map_err(|_| invalid())?;
        let last: usize = parts[1].trim().parse().map_err(|_| invalid())?;

        // Pages are numbered from 1
        if first == 0 {
            return Err(invalid());
        }

        Ok(Some(Self { first, last }))
    }

    /// Zero-based page indices selected out of `page_count` pages.
    ///
    /// Out-of-bounds ends are clamped; a reversed range selects nothing.
    pub fn indices(&self, page_count: usize) -> Range<usize> {
        let start = (self.first - 1).min(page_count);
        let end = self.last.min(page_count).max(start);
        start..end
    }
}

/// Extract the normalized text of a document, optionally limited to a page range.
///
/// The range is validated before any page is read.
pub fn extract_text(
    document: &Document,
    page_range: Option<&str>,
    fold_typography: bool,
) -> Result<String> {
    let range = PageRange::parse(page_range)?;
    let indices = match range {
        Some(r) => r.indices(document.page_count()),
        None => 0..document.page_count(),
    };

    let mut text = String::new();
    for index in indices {
        if let Some(page_text) = document.page_text(index) {
            text.push_str(page_text);
            text.push('\n');
        }
    }

    Ok(normalize_text(&text, fold_typography))
}
