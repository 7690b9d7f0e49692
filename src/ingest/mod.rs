//! Ingestion of raw support content from its two sources.
//!
//! * [`scrape`] discovers article links on the support listing page and
//!   pulls the readable text out of each article.
//! * [`pdf`] loads local PDF files, one document per page.
//!
//! Both produce [`SourceDocument`] values that feed the splitter.

pub mod pdf;
pub mod scrape;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use pdf::load_pdf_documents;
pub use scrape::{scrape_support_site, visible_text};

/// One unit of source material headed for chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Where the text came from: an article URL or a PDF path.
    pub source: String,
    /// Extracted plain text.
    pub text: String,
    /// Provenance carried through to the stored chunks.
    pub metadata: serde_json::Value,
}

impl SourceDocument {
    /// Document extracted from a scraped web page.
    pub fn web(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            metadata: serde_json::json!({ "origin": "web" }),
        }
    }

    /// Document extracted from one page of a local PDF.
    pub fn pdf_page(path: &Path, text: impl Into<String>, page: u32) -> Self {
        Self {
            source: path.display().to_string(),
            text: text.into(),
            metadata: serde_json::json!({ "origin": "pdf", "page": page }),
        }
    }
}
