//! Deterministic embedding models and scripted completion providers shared
//! across the integration tests. Nothing here talks to a real API.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rig::embeddings::embedding::{Embedding, EmbeddingError, EmbeddingModel};

use helpsmith::retriever::{CompletionPrompt, CompletionProvider};
use helpsmith::types::BotError;

/// Embedding model that hashes the text into a stable 8-dim vector.
/// Similar only to identical text, which is enough for plumbing tests.
#[derive(Clone)]
pub struct HashEmbedding;

impl EmbeddingModel for HashEmbedding {
    const MAX_DOCUMENTS: usize = 16;

    type Client = ();

    fn make(_client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
        Self
    }

    fn ndims(&self) -> usize {
        8
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let docs: Vec<String> = texts.into_iter().collect();
        async move {
            Ok(docs
                .into_iter()
                .map(|document| Embedding {
                    vec: hash_to_vec(&document),
                    document,
                })
                .collect())
        }
    }
}

/// Embeds one text with `model` and converts it to the f32 vector that
/// [`helpsmith::index::SupportIndex::search`] expects.
pub async fn embed_query<E: EmbeddingModel>(model: &E, text: &str) -> Vec<f32> {
    let embeddings = model
        .embed_texts(vec![text.to_string()])
        .await
        .expect("mock embedding never fails");
    embeddings[0].vec.iter().map(|&v| v as f32).collect()
}

fn hash_to_vec(text: &str) -> Vec<f64> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..8)
        .map(|i| {
            let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
            (bits as f64) / u32::MAX as f64
        })
        .collect()
}

/// Embedding model that counts occurrences of a tiny fixed vocabulary, so
/// texts sharing words really are closer in cosine space. The trailing bias
/// dimension keeps every vector away from zero.
#[derive(Clone)]
pub struct KeywordEmbedding;

const VOCABULARY: [&str; 8] = [
    "support", "hours", "account", "angel", "password", "charges", "trading", "refund",
];

impl EmbeddingModel for KeywordEmbedding {
    const MAX_DOCUMENTS: usize = 16;

    type Client = ();

    fn make(_client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
        Self
    }

    fn ndims(&self) -> usize {
        VOCABULARY.len() + 1
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let docs: Vec<String> = texts.into_iter().collect();
        async move {
            Ok(docs
                .into_iter()
                .map(|document| Embedding {
                    vec: keyword_counts(&document),
                    document,
                })
                .collect())
        }
    }
}

fn keyword_counts(text: &str) -> Vec<f64> {
    let lowered = text.to_lowercase();
    let mut counts: Vec<f64> = VOCABULARY
        .iter()
        .map(|word| lowered.matches(word).count() as f64)
        .collect();
    counts.push(1.0);
    counts
}

/// Embedding model that always fails, for exercising build failure paths.
#[derive(Clone)]
pub struct FailingEmbedding;

impl EmbeddingModel for FailingEmbedding {
    const MAX_DOCUMENTS: usize = 16;

    type Client = ();

    fn make(_client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
        Self
    }

    fn ndims(&self) -> usize {
        8
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let _ = texts.into_iter().count();
        async move {
            Err(EmbeddingError::ProviderError(
                "scripted embedding failure".to_string(),
            ))
        }
    }
}

/// Completion provider that returns a fixed answer and records every prompt
/// it was handed.
pub struct ScriptedCompletion {
    answer: String,
    prompts: Arc<Mutex<Vec<CompletionPrompt>>>,
}

impl ScriptedCompletion {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts seen so far, oldest first.
    pub fn prompts(&self) -> Vec<CompletionPrompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Handle that stays valid after the provider moves into the retriever.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<CompletionPrompt>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: CompletionPrompt) -> Result<String, BotError> {
        self.prompts.lock().unwrap().push(prompt);
        Ok(self.answer.clone())
    }
}

/// Completion provider that always fails.
pub struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _prompt: CompletionPrompt) -> Result<String, BotError> {
        Err(BotError::Completion("the model is unreachable".to_string()))
    }
}
