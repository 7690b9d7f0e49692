//! ```text
//! Support listing ──► ingest::scrape ──┐
//! Local PDF files ──► ingest::pdf    ──┴─► SourceDocument
//!
//! SourceDocument ──► splitter::split_documents ──► Chunk
//!
//! Chunk ──► index::SupportIndex::build ──► SQLite file (chunks + vec0)
//!
//! Question ──► retriever::SupportRetriever ──► index search ──► completion
//!                               │
//! pipeline::SupportBot ─────────┴─► initialize() once, then ask() per turn
//! ```
//!
pub mod config;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod pipeline;
pub mod retriever;
pub mod splitter;
pub mod types;

pub use config::BotConfig;
pub use index::{RetrievedChunk, SupportIndex};
pub use ingest::SourceDocument;
pub use memory::{ChatMessage, SessionMemory};
pub use pipeline::SupportBot;
pub use retriever::{CompletionPrompt, CompletionProvider, RigCompletion, SupportRetriever};
pub use splitter::{Chunk, split_documents, split_text};
pub use types::BotError;
