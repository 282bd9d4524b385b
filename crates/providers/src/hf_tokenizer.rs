//! Model-specific token counting with a Hugging Face `tokenizer.json`.
//!
//! The vocabulary is fetched through the hub cache on first use and kept
//! for the life of the process. Loading and encoding are CPU/disk bound,
//! so both run on the blocking pool.

use async_trait::async_trait;
use ctxkeeper_core::error::TokenizerError;
use ctxkeeper_core::tokenizer::Tokenizer;
use hf_hub::api::sync::Api;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Where the vocabulary comes from.
#[derive(Debug, Clone)]
enum Source {
    /// A hub repository id, e.g. `deepseek-ai/DeepSeek-R1`
    Hub(String),
    /// A local `tokenizer.json`
    File(PathBuf),
}

pub struct HfTokenizer {
    name: String,
    source: Source,
    inner: Mutex<Option<Arc<tokenizers::Tokenizer>>>,
}

impl HfTokenizer {
    /// Count with the tokenizer published in hub repository `repo`.
    pub fn from_hub(repo: impl Into<String>) -> Self {
        let repo = repo.into();
        Self {
            name: repo.clone(),
            source: Source::Hub(repo),
            inner: Mutex::new(None),
        }
    }

    /// Count with a local `tokenizer.json`.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            source: Source::File(path),
            inner: Mutex::new(None),
        }
    }

    fn load(source: &Source) -> Result<tokenizers::Tokenizer, TokenizerError> {
        let path = match source {
            Source::File(path) => path.clone(),
            Source::Hub(repo) => {
                info!(repo = %repo, "Fetching tokenizer from the Hugging Face hub");
                let api = Api::new().map_err(|e| {
                    TokenizerError::Unavailable(format!("Failed to initialize hub API: {e}"))
                })?;
                api.model(repo.clone()).get("tokenizer.json").map_err(|e| {
                    TokenizerError::Unavailable(format!(
                        "Failed to download tokenizer from '{repo}': {e}"
                    ))
                })?
            }
        };

        tokenizers::Tokenizer::from_file(&path)
            .map_err(|e| TokenizerError::Unavailable(format!("Failed to load tokenizer: {e}")))
    }

    async fn loaded(&self) -> Result<Arc<tokenizers::Tokenizer>, TokenizerError> {
        let mut state = self.inner.lock().await;
        if let Some(tokenizer) = state.as_ref() {
            return Ok(Arc::clone(tokenizer));
        }

        let source = self.source.clone();
        let tokenizer = tokio::task::spawn_blocking(move || Self::load(&source))
            .await
            .map_err(|e| {
                TokenizerError::Unavailable(format!("Tokenizer loading task failed: {e}"))
            })??;

        let tokenizer = Arc::new(tokenizer);
        *state = Some(Arc::clone(&tokenizer));
        Ok(tokenizer)
    }
}

#[async_trait]
impl Tokenizer for HfTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        let tokenizer = self.loaded().await?;
        let text = text.to_owned();

        tokio::task::spawn_blocking(move || {
            tokenizer
                .encode(text.as_str(), false)
                .map(|encoding| encoding.len())
                .map_err(|e| TokenizerError::Encoding(e.to_string()))
        })
        .await
        .map_err(|e| TokenizerError::Encoding(format!("Encoding task failed: {e}")))?
    }
}
