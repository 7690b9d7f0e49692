//! Question answering over the vector index.
//!
//! The retriever embeds the question and sends exactly one completion
//! request per question. Retrieved chunks travel in the preamble; prior
//! turns go along as chat history with the question as the final user
//! message. Conversation memory is only written on success, so the caller
//! decides what a failed turn looks like.

use std::sync::Arc;

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use rig::message::{AssistantContent, Message};
use tracing::debug;

use crate::index::{RetrievedChunk, SupportIndex};
use crate::memory::{ChatMessage, SessionMemory};
use crate::types::BotError;

/// Canned reply for questions with no content. No embedding or completion
/// call is made for these.
pub const EMPTY_QUESTION_REPLY: &str =
    "Please type a question about our support articles and I'll look it up.";

const PREAMBLE_HEADER: &str = "You are a support assistant for our customers. \
    Answer using only the support content below. If the content does not \
    cover the question, say you don't know instead of guessing.";

const COMPLETION_TEMPERATURE: f64 = 0.0;

/// Everything a provider needs for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    /// System framing, including the rendered retrieval context.
    pub preamble: String,
    /// Prior conversation turns, oldest first.
    pub history: Vec<ChatMessage>,
    /// The new user question.
    pub question: String,
}

/// Boundary to the hosted completion API.
///
/// Production wraps a rig completion model; tests substitute scripted
/// implementations.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produces the answer text for an assembled prompt.
    async fn complete(&self, prompt: CompletionPrompt) -> Result<String, BotError>;
}

/// [`CompletionProvider`] backed by any rig completion model.
pub struct RigCompletion<M>
where
    M: CompletionModel,
{
    model: M,
}

impl<M> RigCompletion<M>
where
    M: CompletionModel,
{
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M> CompletionProvider for RigCompletion<M>
where
    M: CompletionModel,
{
    async fn complete(&self, prompt: CompletionPrompt) -> Result<String, BotError> {
        let history: Vec<Message> = prompt.history.iter().map(to_rig_message).collect();
        let request = self
            .model
            .completion_request(Message::user(prompt.question))
            .preamble(prompt.preamble)
            .messages(history)
            .temperature(COMPLETION_TEMPERATURE)
            .build();

        let response = self
            .model
            .completion(request)
            .await
            .map_err(|err| BotError::Completion(err.to_string()))?;

        response
            .choice
            .into_iter()
            .find_map(|choice| match choice {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .ok_or_else(|| BotError::Completion("response carried no text".to_string()))
    }
}

fn to_rig_message(turn: &ChatMessage) -> Message {
    if turn.has_role(ChatMessage::ASSISTANT) {
        Message::assistant(turn.content.clone())
    } else {
        Message::user(turn.content.clone())
    }
}

/// Retrieval-augmented answering over one [`SupportIndex`].
pub struct SupportRetriever<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    model: E,
    index: SupportIndex<E>,
    completion: Arc<dyn CompletionProvider>,
    top_k: usize,
}

impl<E> SupportRetriever<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    pub fn new(
        model: E,
        index: SupportIndex<E>,
        completion: Arc<dyn CompletionProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            model,
            index,
            completion,
            top_k,
        }
    }

    /// Answers one question and appends the exchange to `memory`.
    ///
    /// Empty questions get [`EMPTY_QUESTION_REPLY`] without touching the
    /// network. On any error nothing is recorded; the caller owns the
    /// failed turn.
    pub async fn answer(
        &self,
        question: &str,
        memory: &mut SessionMemory,
    ) -> Result<String, BotError> {
        if question.trim().is_empty() {
            memory.record_exchange(question, EMPTY_QUESTION_REPLY);
            return Ok(EMPTY_QUESTION_REPLY.to_string());
        }

        let query_embedding = self.embed_question(question).await?;
        let hits = self.index.search(&query_embedding, self.top_k).await?;
        debug!(question, hits = hits.len(), "retrieved context chunks");

        let prompt = CompletionPrompt {
            preamble: build_preamble(&hits),
            history: memory.turns().to_vec(),
            question: question.to_string(),
        };
        let answer = self.completion.complete(prompt).await?;
        memory.record_exchange(question, &answer);
        Ok(answer)
    }

    async fn embed_question(&self, question: &str) -> Result<Vec<f32>, BotError> {
        let mut embeddings = self
            .model
            .embed_texts(vec![question.to_string()])
            .await
            .map_err(|err| BotError::Embedding(err.to_string()))?;
        if embeddings.is_empty() {
            return Err(BotError::Embedding(
                "no embedding returned for the question".to_string(),
            ));
        }
        let embedding = embeddings.remove(0);
        Ok(embedding.vec.into_iter().map(|value| value as f32).collect())
    }
}

/// Renders the retrieved chunks into the system preamble.
fn build_preamble(hits: &[(RetrievedChunk, f32)]) -> String {
    let mut preamble = String::from(PREAMBLE_HEADER);
    if hits.is_empty() {
        preamble.push_str("\n\nNo support content matched this question.");
        return preamble;
    }
    preamble.push_str("\n\nSupport content:");
    for (chunk, _score) in hits {
        preamble.push_str("\n\n---\n");
        preamble.push_str(&chunk.content);
    }
    preamble
}
