//! Text extraction from input documents.
//!
//! PDF documents are read page by page; pages or whole documents that
//! fail to yield text are skipped with a warning rather than aborting
//! the build. Plain-text and markdown documents pass through as-is.

use crate::types::Document;
use docqa_core::{AppError, AppResult};

/// Extract text from every document and concatenate it into a single
/// string, in input order.
///
/// # Errors
/// Returns `AppError::NoExtractableContent` if the concatenated text is
/// empty or whitespace-only after all documents were processed.
pub fn extract_documents(documents: &[Document]) -> AppResult<String> {
    let mut text = String::new();

    for doc in documents {
        match extract_document(doc) {
            Ok(doc_text) => {
                tracing::debug!(
                    "Extracted {} characters from '{}'",
                    doc_text.len(),
                    doc.name
                );
                text.push_str(&doc_text);
            }
            Err(e) => {
                tracing::warn!("Skipping document '{}': {}", doc.name, e);
            }
        }
    }

    if text.trim().is_empty() {
        return Err(AppError::NoExtractableContent);
    }

    Ok(text)
}

fn extract_document(doc: &Document) -> AppResult<String> {
    if is_pdf(doc) {
        extract_pdf(doc)
    } else {
        Ok(String::from_utf8_lossy(&doc.bytes).into_owned())
    }
}

fn is_pdf(doc: &Document) -> bool {
    doc.name.to_lowercase().ends_with(".pdf") || doc.bytes.starts_with(b"%PDF-")
}

fn extract_pdf(doc: &Document) -> AppResult<String> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(&doc.bytes)
        .map_err(|e| AppError::Other(format!("failed to read PDF: {}", e)))?;

    let mut text = String::new();
    for (i, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            tracing::warn!("No text on page {} of '{}', skipping", i + 1, doc.name);
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }

    Ok(text)
}
