//! PDF Processor
//!
//! Extracts embedded text from digitally generated PDF reports. Scanned
//! reports carry no text layer and are rejected later by the pipeline.

use careplan_utils::{CarePlanError, CarePlanResult};
use lopdf::Document;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// PDF processing result
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Non-empty page texts joined with newlines, trimmed.
    pub text: String,
    pub pages: Vec<PageContent>,
    pub page_count: usize,
}

impl PdfContent {
    pub fn pages_with_text(&self) -> usize {
        self.pages.len()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Text of a single page that produced any
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: u32,
    pub text: String,
}

/// PDF processor
pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text page by page.
    ///
    /// Fails only when the document cannot be parsed or has no pages. A page
    /// whose text cannot be decoded contributes nothing.
    pub fn extract(&self, data: &[u8]) -> CarePlanResult<PdfContent> {
        let document = Document::load_mem(data).map_err(|e| {
            CarePlanError::unreadable_document(format!("Failed to parse PDF: {}", e))
        })?;

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(CarePlanError::unreadable_document("PDF contains no pages"));
        }

        let mut pages = Vec::new();
        for &page_number in &page_numbers {
            match document.extract_text(&[page_number]) {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        pages.push(PageContent {
                            page_number,
                            text: text.to_string(),
                        });
                    }
                }
                Err(e) => debug!(page = page_number, error = %e, "Skipping page without decodable text"),
            }
        }

        let mut text = pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if text.is_empty() {
            if let Some(whole) = whole_document_text(data) {
                debug!(chars = whole.chars().count(), "Recovered text with whole-document pass");
                text = whole;
            }
        }

        debug!(
            page_count = page_numbers.len(),
            pages_with_text = pages.len(),
            chars = text.chars().count(),
            "PDF text extracted"
        );

        Ok(PdfContent {
            text,
            pages,
            page_count: page_numbers.len(),
        })
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

// pdf-extract can panic on malformed font programs.
fn whole_document_text(data: &[u8]) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data))) {
        Ok(Ok(text)) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Ok(Err(e)) => {
            debug!(error = %e, "Whole-document text extraction failed");
            None
        }
        Err(_) => {
            debug!("Whole-document text extraction panicked");
            None
        }
    }
}
