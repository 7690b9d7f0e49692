//! Persisted vector index over chunk embeddings.
//!
//! Chunks live in a plain `chunks` table inside a single SQLite file; their
//! embeddings live in the companion `chunks_embeddings` vec0 virtual table
//! that rig-sqlite maintains with matching rowids. Building embeds every
//! chunk before anything touches disk, so an embedding failure cannot leave
//! a half-written index behind. Search runs a cosine distance scan through
//! the vec0 table with a raw query, since the caller already holds the
//! query embedding.

use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;
use tokio_rusqlite::{Connection, ffi};
use tracing::info;
use uuid::Uuid;

use crate::splitter::Chunk;
use crate::types::BotError;

/// Row schema for persisted chunks.
#[derive(Clone, Debug)]
pub struct StoredChunk {
    pub id: String,
    pub source: String,
    pub ordinal: usize,
    pub content: String,
    pub metadata: serde_json::Value,
}

impl From<Chunk> for StoredChunk {
    fn from(chunk: Chunk) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: chunk.source,
            ordinal: chunk.ordinal,
            content: chunk.text,
            metadata: chunk.metadata,
        }
    }
}

impl SqliteVectorStoreTable for StoredChunk {
    fn name() -> &'static str {
        "chunks"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("source", "TEXT").indexed(),
            Column::new("ordinal", "TEXT"),
            Column::new("metadata", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("source", Box::new(self.source.clone())),
            ("ordinal", Box::new(self.ordinal.to_string())),
            ("metadata", Box::new(self.metadata.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

/// A chunk pulled back out of the index by similarity search.
#[derive(Clone, Debug)]
pub struct RetrievedChunk {
    pub id: String,
    pub source: String,
    pub ordinal: usize,
    pub content: String,
    pub metadata: serde_json::Value,
}

/// Searchable index over one support-content snapshot.
#[derive(Clone)]
pub struct SupportIndex<E>
where
    E: EmbeddingModel + 'static,
{
    store: SqliteVectorStore<E, StoredChunk>,
    /// Connection clone for the raw queries rig-sqlite does not expose.
    conn: Connection,
}

impl<E> std::fmt::Debug for SupportIndex<E>
where
    E: EmbeddingModel + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupportIndex").finish_non_exhaustive()
    }
}

impl<E> SupportIndex<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Builds a fresh index at `path`, replacing any previous file.
    ///
    /// Every chunk is embedded before the old file is removed, so an
    /// embedding failure keeps whatever index was there. A persistence
    /// failure deletes the new file rather than leaving it half-filled.
    pub async fn build(
        path: impl AsRef<Path>,
        model: &E,
        chunks: Vec<Chunk>,
    ) -> Result<Self, BotError> {
        let path = path.as_ref();
        let vectors = embed_in_batches(model, &chunks).await?;

        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }
        let index = Self::attach(path, model).await?;

        let rows: Vec<(StoredChunk, OneOrMany<Embedding>)> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vec)| {
                let stored = StoredChunk::from(chunk);
                let embedding = Embedding {
                    document: stored.content.clone(),
                    vec,
                };
                (stored, OneOrMany::one(embedding))
            })
            .collect();
        let row_count = rows.len();

        if !rows.is_empty() {
            if let Err(err) = index.store.add_rows(rows).await {
                let _ = tokio::fs::remove_file(path).await;
                return Err(BotError::Storage(err.to_string()));
            }
        }

        info!(chunks = row_count, path = %path.display(), "vector index built");
        Ok(index)
    }

    /// Reopens an index built by a previous run.
    pub async fn open(path: impl AsRef<Path>, model: &E) -> Result<Self, BotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BotError::Storage(format!(
                "no index file at {}",
                path.display()
            )));
        }
        Self::attach(path, model).await
    }

    async fn attach(path: &Path, model: &E) -> Result<Self, BotError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| BotError::Storage(err.to_string()))?;
        conn.call(|conn| {
            let probed = conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0));
            match probed {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Rusqlite(err)),
            }
        })
        .await
        .map_err(|err| BotError::Storage(err.to_string()))?;

        // Keep a handle for raw queries before the store takes ownership.
        let conn_for_queries = conn.clone();
        let store = SqliteVectorStore::new(conn, model)
            .await
            .map_err(|err| BotError::Storage(err.to_string()))?;
        Ok(Self {
            store,
            conn: conn_for_queries,
        })
    }

    /// Returns up to `top_k` chunks ranked by cosine similarity.
    ///
    /// Rows are ordered by ascending distance with ascending rowid as the
    /// tiebreaker, so equally similar chunks come back in insertion order.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<(RetrievedChunk, f32)>, BotError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let embedding_json = serde_json::to_string(query_embedding)
            .map_err(|err| BotError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT c.id, c.source, c.ordinal, c.content, c.metadata, \
                         vec_distance_cosine(e.embedding, vec_f32(?)) as distance \
                         FROM chunks c \
                         JOIN chunks_embeddings e ON e.rowid = c.rowid \
                         ORDER BY distance ASC, c.rowid ASC \
                         LIMIT {top_k}"
                    ))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([&embedding_json], |row| {
                        let chunk = RetrievedChunk {
                            id: row.get(0)?,
                            source: row.get(1)?,
                            ordinal: row.get::<_, String>(2)?.parse().unwrap_or(0),
                            content: row.get(3)?,
                            metadata: row
                                .get::<_, String>(4)
                                .map(|raw| serde_json::from_str(&raw).unwrap_or_default())
                                .unwrap_or_default(),
                        };
                        let distance: f32 = row.get(5)?;
                        Ok((chunk, 1.0 - distance))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| BotError::Storage(err.to_string()))
    }

    /// Number of chunks currently persisted.
    pub async fn count(&self) -> Result<usize, BotError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| BotError::Storage(err.to_string()))
    }
}

/// Embeds chunk texts in model-sized batches, preserving input order.
async fn embed_in_batches<E>(model: &E, chunks: &[Chunk]) -> Result<Vec<Vec<f64>>, BotError>
where
    E: EmbeddingModel,
{
    let batch_size = E::MAX_DOCUMENTS.max(1);
    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let embedded = model
            .embed_texts(texts)
            .await
            .map_err(|err| BotError::Embedding(err.to_string()))?;
        if embedded.len() != batch.len() {
            return Err(BotError::Embedding(format!(
                "asked for {} embeddings, received {}",
                batch.len(),
                embedded.len()
            )));
        }
        vectors.extend(embedded.into_iter().map(|embedding| embedding.vec));
    }
    Ok(vectors)
}

fn register_sqlite_vec() -> Result<(), BotError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    let outcome = REGISTERED.get_or_init(|| unsafe {
        type SqliteExtensionInit = unsafe extern "C" fn(
            *mut ffi::sqlite3,
            *mut *mut c_char,
            *const ffi::sqlite3_api_routines,
        ) -> i32;

        let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
        let init_fn: SqliteExtensionInit =
            transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
        let rc = ffi::sqlite3_auto_extension(Some(init_fn));
        if rc != 0 {
            Err(format!(
                "failed to register sqlite-vec extension (code {rc})"
            ))
        } else {
            Ok(())
        }
    });

    outcome.clone().map_err(BotError::Storage)
}
