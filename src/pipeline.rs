//! End-to-end assembly of the bot behind a two-operation facade.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use rig::embeddings::EmbeddingModel;
use tracing::{error, info, warn};

use crate::config::BotConfig;
use crate::index::SupportIndex;
use crate::ingest::{load_pdf_documents, scrape_support_site};
use crate::memory::SessionMemory;
use crate::retriever::{CompletionProvider, SupportRetriever};
use crate::splitter::split_documents;
use crate::types::BotError;

/// The assembled bot: one index, one retriever, ready to answer.
pub struct SupportBot<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    retriever: SupportRetriever<E>,
}

impl<E> std::fmt::Debug for SupportBot<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupportBot").finish_non_exhaustive()
    }
}

impl<E> SupportBot<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Prepares the bot, building the vector index if needed.
    ///
    /// An index file from a previous run is reused as-is unless
    /// `config.force_rebuild` is set. Otherwise the full run happens here:
    /// scrape the support site, load local PDFs, split, embed, persist.
    /// Any failure along the way is returned; a bot without an index does
    /// not exist.
    pub async fn initialize(
        config: BotConfig,
        embedding_model: E,
        completion: Arc<dyn CompletionProvider>,
    ) -> Result<Self, BotError> {
        config.validate()?;

        let index = if config.index_path.exists() && !config.force_rebuild {
            info!(path = %config.index_path.display(), "reusing existing vector index");
            SupportIndex::open(&config.index_path, &embedding_model).await?
        } else {
            build_index(&config, &embedding_model).await?
        };

        let retriever =
            SupportRetriever::new(embedding_model, index, completion, config.top_k);
        Ok(Self { retriever })
    }

    /// Answers one question, never failing the conversation.
    ///
    /// Errors from retrieval or the completion API degrade into an
    /// apologetic answer that is recorded in `memory` like any other turn,
    /// so the session stays coherent across hiccups.
    pub async fn ask(&self, question: &str, memory: &mut SessionMemory) -> String {
        match self.retriever.answer(question, memory).await {
            Ok(answer) => answer,
            Err(err) => {
                error!(error = %err, "failed to answer question");
                let fallback = format!("Sorry, I ran into a problem: {err}");
                memory.record_exchange(question, &fallback);
                fallback
            }
        }
    }
}

async fn build_index<E>(config: &BotConfig, model: &E) -> Result<SupportIndex<E>, BotError>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    let started = Instant::now();
    let client = Client::builder()
        .user_agent(concat!("helpsmith/", env!("CARGO_PKG_VERSION")))
        .use_rustls_tls()
        .build()?;

    let mut documents = scrape_support_site(&client, config).await?;
    documents.extend(load_pdf_documents(&config.pdf_dir)?);
    if documents.is_empty() {
        warn!("no source documents found, the index will be empty");
    }
    info!(documents = documents.len(), "collected source documents");

    let chunks = split_documents(&documents, config.chunk_size, config.chunk_overlap)?;
    info!(chunks = chunks.len(), "split documents");

    if let Some(parent) = config.index_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let index = SupportIndex::build(&config.index_path, model, chunks).await?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "index construction finished"
    );
    Ok(index)
}
