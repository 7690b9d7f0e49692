//! Local PDF ingestion.
//!
//! Every `.pdf` file in the configured directory contributes one
//! [`SourceDocument`] per page, so chunk provenance can point at a page
//! instead of a whole file. A missing directory just means there are no
//! PDFs to load; a file that will not parse as a PDF is an error.

use std::path::{Path, PathBuf};

use lopdf::Document as PdfFile;
use tracing::{debug, info};

use super::SourceDocument;
use crate::types::BotError;

/// Loads all PDFs under `dir`, in lexicographic path order.
pub fn load_pdf_documents(dir: &Path) -> Result<Vec<SourceDocument>, BotError> {
    if !dir.is_dir() {
        info!(dir = %dir.display(), "no pdf directory, skipping");
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| has_pdf_extension(path))
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in &paths {
        let pages = load_pdf_pages(path)?;
        debug!(path = %path.display(), pages = pages.len(), "loaded pdf");
        documents.extend(pages);
    }
    info!(files = paths.len(), pages = documents.len(), "pdf ingestion finished");
    Ok(documents)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// One document per page with extractable text; blank pages are dropped.
fn load_pdf_pages(path: &Path) -> Result<Vec<SourceDocument>, BotError> {
    let pdf = PdfFile::load(path).map_err(|err| BotError::FileFormat {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let mut pages = Vec::new();
    for (page_number, _) in pdf.get_pages() {
        let text = pdf
            .extract_text(&[page_number])
            .map_err(|err| BotError::FileFormat {
                path: path.to_path_buf(),
                message: format!("page {page_number}: {err}"),
            })?;
        if text.trim().is_empty() {
            continue;
        }
        pages.push(SourceDocument::pdf_page(path, text, page_number));
    }
    Ok(pages)
}
