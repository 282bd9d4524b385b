//! Prompt assembly under a token budget.
//!
//! A prompt is always `[system preamble] + history + [new user message]`.
//! When it measures over budget, the oldest exchange is evicted from the
//! stored history and the prompt is rebuilt, until it fits or there is no
//! history left to give up.
//!
//! # Termination
//!
//! Every pass through the fitting loop either returns or removes two
//! entries from a finite history, so the loop runs at most
//! `history.len() / 2 + 1` times. A history that cannot be trimmed further
//! (empty, or a single stray entry) ends the loop with the minimal prompt.
//!
//! # Eviction
//!
//! Eviction is strictly oldest-first and always a fixed two-entry prefix,
//! regardless of how many tokens that prefix frees. Nothing is summarized.

use crate::context::token::render_for_count;
use ctxkeeper_core::error::{MemoryError, TokenizerError};
use ctxkeeper_core::message::{Message, SessionKey};
use ctxkeeper_core::tokenizer::Tokenizer;
use ctxkeeper_memory::{ContextStore, Persistence};
use std::sync::Arc;
use tracing::{debug, warn};

/// The prompt produced by [`PromptAssembler::build_and_fit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedPrompt {
    /// System message, history window, then the new user message.
    pub messages: Vec<Message>,
    /// Measured size of `messages`.
    pub token_count: usize,
    /// The budget it was fitted against.
    pub budget: usize,
    /// Exchanges evicted from the stored history while fitting.
    pub trims: usize,
    /// Set when even the minimal prompt (system + new message) is over
    /// budget. `messages` is then that minimal prompt.
    pub oversized: bool,
}

/// Errors from prompt assembly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssemblyError {
    #[error("Failed to measure prompt: {0}")]
    Tokenizer(#[from] TokenizerError),
}

/// Builds bounded prompts from the context store and records completed
/// exchanges back into it.
#[derive(Clone)]
pub struct PromptAssembler {
    store: ContextStore,
    persistence: Persistence,
    tokenizer: Arc<dyn Tokenizer>,
}

impl PromptAssembler {
    pub fn new(
        store: ContextStore,
        persistence: Persistence,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        Self {
            store,
            persistence,
            tokenizer,
        }
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    fn candidate(system_preamble: &str, history: Vec<Message>, new_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_preamble));
        messages.extend(history);
        messages.push(Message::user(new_message));
        messages
    }

    async fn measure(&self, messages: &[Message]) -> Result<usize, TokenizerError> {
        self.tokenizer.count_tokens(&render_for_count(messages)).await
    }

    /// Assemble a prompt for `key` that fits in `max_tokens`, trimming the
    /// stored history oldest-first as needed.
    ///
    /// The store is only trimmed, never appended to; a caller that abandons
    /// the turn afterwards leaves no half-recorded exchange behind.
    pub async fn build_and_fit(
        &self,
        key: SessionKey,
        system_preamble: &str,
        new_message: &str,
        max_tokens: usize,
    ) -> Result<FittedPrompt, AssemblyError> {
        let mut trims = 0;

        loop {
            let history = self.store.get(key).await;
            let history_len = history.len();
            let messages = Self::candidate(system_preamble, history, new_message);
            let token_count = self.measure(&messages).await?;

            if token_count <= max_tokens {
                debug!(
                    group = key.group,
                    participant = key.participant,
                    tokens = token_count,
                    budget = max_tokens,
                    trims,
                    "Prompt fits"
                );
                return Ok(FittedPrompt {
                    messages,
                    token_count,
                    budget: max_tokens,
                    trims,
                    oversized: false,
                });
            }

            if history_len == 0 {
                warn!(
                    group = key.group,
                    participant = key.participant,
                    tokens = token_count,
                    budget = max_tokens,
                    "Turn exceeds budget even without history"
                );
                return Ok(FittedPrompt {
                    messages,
                    token_count,
                    budget: max_tokens,
                    trims,
                    oversized: true,
                });
            }

            if !self.store.trim_oldest_exchange(key).await {
                // A lone entry cannot be evicted as an exchange; leave it
                // stored but keep it out of this prompt.
                let messages = Self::candidate(system_preamble, Vec::new(), new_message);
                let token_count = self.measure(&messages).await?;
                let oversized = token_count > max_tokens;
                if oversized {
                    warn!(
                        group = key.group,
                        participant = key.participant,
                        tokens = token_count,
                        budget = max_tokens,
                        "Turn exceeds budget even without history"
                    );
                }
                return Ok(FittedPrompt {
                    messages,
                    token_count,
                    budget: max_tokens,
                    trims,
                    oversized,
                });
            }
            trims += 1;
        }
    }

    /// Append the `(user, assistant)` pair to the history, then flush the
    /// participant's record. Call only after a successful reply.
    ///
    /// The in-memory append always happens; the returned error is the
    /// flush's, if any.
    pub async fn record_exchange(
        &self,
        key: SessionKey,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<(), MemoryError> {
        self.store
            .append(
                key,
                vec![Message::user(user_message), Message::assistant(assistant_reply)],
            )
            .await;
        self.persistence.flush(&self.store, key).await
    }
}
