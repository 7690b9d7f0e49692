//! Shared error type for the support-bot pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced anywhere in the pipeline.
///
/// Everything raised during index construction propagates out of
/// [`crate::pipeline::SupportBot::initialize`] unchanged; the per-question
/// path converts errors into a visible chat turn at the `ask` boundary
/// instead of crashing the session.
#[derive(Debug, Error)]
pub enum BotError {
    /// An HTTP request failed (listing page or article fetch).
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// A local file could not be read as a PDF.
    #[error("could not read {} as a PDF: {message}", path.display())]
    FileFormat {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message describing the failure.
        message: String,
    },

    /// The embedding API failed or returned an unusable response.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// The completion API failed or returned an unusable response.
    #[error("completion request failed: {0}")]
    Completion(String),

    /// Missing credentials or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// SQLite or vector-index failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Markup or document content that cannot be processed.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Filesystem failure outside PDF parsing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
