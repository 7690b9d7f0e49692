//! Environment-driven configuration.
//!
//! All settings come from `SUPPORT_BOT_*` environment variables with
//! compiled defaults, after a best-effort `.env` load. Defaults target the
//! Angel One support center the bot was originally built around.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::types::BotError;

const DEFAULT_BASE_URL: &str = "https://www.angelone.in/support";
const DEFAULT_LINK_SUBSTRING: &str = "/support/";
const DEFAULT_PDF_DIR: &str = "pdfs";
const DEFAULT_INDEX_PATH: &str = "support_index.sqlite";
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;
const DEFAULT_TOP_K: usize = 4;
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Runtime settings for the whole pipeline.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Listing page whose anchors are scanned for support articles.
    pub base_url: Url,
    /// Substring an href must contain to count as a support article.
    pub link_substring: String,
    /// Directory of local PDFs ingested alongside the scraped pages.
    pub pdf_dir: PathBuf,
    /// SQLite file the vector index persists to.
    pub index_path: PathBuf,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of the previous chunk.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Rebuild the index even when the file already exists.
    pub force_rebuild: bool,
    /// Optional cap on how many scraped pages are ingested.
    pub page_limit: Option<usize>,
    /// Completion model name passed to the provider client.
    pub completion_model: String,
    /// Embedding model name passed to the provider client.
    pub embedding_model: String,
}

impl BotConfig {
    /// Loads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] naming the variable when a value fails
    /// to parse, or when the resulting chunk geometry is invalid.
    pub fn from_env() -> Result<Self, BotError> {
        dotenvy::dotenv().ok();

        let base_url =
            env::var("SUPPORT_BOT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|err| BotError::Config(format!("SUPPORT_BOT_BASE_URL: {err}")))?;

        let link_substring = env::var("SUPPORT_BOT_LINK_SUBSTRING")
            .unwrap_or_else(|_| DEFAULT_LINK_SUBSTRING.to_string());

        let pdf_dir = env::var("SUPPORT_BOT_PDF_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PDF_DIR));

        let index_path = env::var("SUPPORT_BOT_INDEX_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_INDEX_PATH));

        let chunk_size = parse_env("SUPPORT_BOT_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse_env("SUPPORT_BOT_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        let top_k = parse_env("SUPPORT_BOT_TOP_K", DEFAULT_TOP_K)?;

        let force_rebuild = env::var("SUPPORT_BOT_REBUILD")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let page_limit = env::var("SUPPORT_BOT_PAGE_LIMIT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok());

        let completion_model = env::var("SUPPORT_BOT_COMPLETION_MODEL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string());
        let embedding_model = env::var("SUPPORT_BOT_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let config = Self {
            base_url,
            link_substring,
            pdf_dir,
            index_path,
            chunk_size,
            chunk_overlap,
            top_k,
            force_rebuild,
            page_limit,
            completion_model,
            embedding_model,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks chunk geometry and retrieval depth.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.chunk_size == 0 {
            return Err(BotError::Config("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(BotError::Config(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(BotError::Config(
                "retrieval depth must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads the OpenAI API key for the live binary.
///
/// # Errors
///
/// Returns [`BotError::Config`] when the variable is unset or empty.
pub fn openai_api_key() -> Result<String, BotError> {
    match env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(BotError::Config("OPENAI_API_KEY is not set".to_string())),
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, BotError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| BotError::Config(format!("{key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> BotConfig {
        BotConfig {
            base_url: Url::parse("https://support.example.com/help").unwrap(),
            link_substring: "/help/".to_string(),
            pdf_dir: PathBuf::from("pdfs"),
            index_path: PathBuf::from("index.sqlite"),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            force_rebuild: false,
            page_limit: None,
            completion_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }

    #[test]
    fn valid_geometry_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let mut config = sample_config();
        config.chunk_overlap = 1000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, BotError::Config(_)));

        config.chunk_overlap = 1200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut config = sample_config();
        config.chunk_size = 0;
        config.chunk_overlap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut config = sample_config();
        config.top_k = 0;
        assert!(config.validate().is_err());
    }
}
