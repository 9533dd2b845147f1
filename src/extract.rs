//! Text extraction for uploaded documents.
//!
//! Supported kinds are decided by filename extension (case-insensitive):
//! `.txt` is decoded as strict UTF-8, `.pdf` is extracted page by page with
//! `pdf-extract`. Anything else is [`PipelineError::UnsupportedFileType`].
//!
//! Pipelines call [`extract_text_blocking`], which runs the parse on the
//! blocking pool. `pdf-extract` panics on some malformed files; the panic
//! is contained in that task and reported as [`PipelineError::PdfExtraction`].

use crate::error::{PipelineError, PipelineResult};
use crate::models::Document;

/// Separator inserted between the text of consecutive PDF pages.
const PAGE_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
}

impl DocumentKind {
    /// Classify a document by its extension.
    pub fn detect(document: &Document) -> PipelineResult<Self> {
        match document.extension().as_str() {
            ".txt" => Ok(DocumentKind::Text),
            ".pdf" => Ok(DocumentKind::Pdf),
            other => Err(PipelineError::UnsupportedFileType {
                extension: if other.is_empty() {
                    "(none)".to_string()
                } else {
                    other.to_string()
                },
            }),
        }
    }
}

/// Extract plain text from a document's bytes.
pub fn extract_text(document: &Document) -> PipelineResult<String> {
    match DocumentKind::detect(document)? {
        DocumentKind::Text => extract_txt(&document.content),
        DocumentKind::Pdf => extract_pdf(&document.content),
    }
}

/// Extract text on the blocking thread pool, converting a parser panic
/// into an extraction error for this document only.
pub async fn extract_text_blocking(document: Document) -> PipelineResult<String> {
    tokio::task::spawn_blocking(move || extract_text(&document))
        .await
        .map_err(|e| {
            if e.is_panic() {
                PipelineError::PdfExtraction("parser panicked on malformed input".to_string())
            } else {
                PipelineError::PdfExtraction(format!("extraction task failed: {}", e))
            }
        })?
}

fn extract_txt(bytes: &[u8]) -> PipelineResult<String> {
    Ok(std::str::from_utf8(bytes)?.to_string())
}

fn extract_pdf(bytes: &[u8]) -> PipelineResult<String> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PipelineError::PdfExtraction(e.to_string()))?;
    join_pages(pages)
}

/// Concatenate page texts, skipping pages with nothing extractable.
fn join_pages(pages: Vec<String>) -> PipelineResult<String> {
    let pages: Vec<String> = pages
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect();
    if pages.is_empty() {
        return Err(PipelineError::PdfExtractionEmpty);
    }
    Ok(pages.join(PAGE_SEPARATOR))
}
