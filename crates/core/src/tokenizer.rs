//! Tokenizer trait — model-specific token counting.
//!
//! Counting is deterministic and side-effect free. It is async because
//! real vocabularies may be loaded lazily or encoded off the runtime
//! threads.

use crate::error::TokenizerError;
use async_trait::async_trait;

#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// A human-readable name (e.g., "heuristic", "deepseek-ai/DeepSeek-R1").
    fn name(&self) -> &str;

    /// Count the tokens `text` encodes to.
    async fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError>;
}
