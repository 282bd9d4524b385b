//! Turn handling: the caller-facing entry point.
//!
//! One turn is `build_and_fit → provider.complete → record_exchange`, run
//! under the session's lock. History is only mutated after a successful
//! reply, so any failure before that point leaves nothing to roll back.

use crate::context::{AssemblyError, PromptAssembler};
use crate::reasoning::strip_reasoning;
use crate::session_lock::SessionLocks;
use ctxkeeper_config::LlmConfig;
use ctxkeeper_core::error::{MemoryError, ProviderError};
use ctxkeeper_core::message::SessionKey;
use ctxkeeper_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A successful turn.
#[derive(Debug)]
pub struct TurnReply {
    /// The reply text shown to the user.
    pub content: String,
    /// Measured size of the prompt that was sent.
    pub prompt_tokens: usize,
    /// Exchanges evicted from history to make the prompt fit.
    pub trims: usize,
    /// Set when the exchange was recorded in memory but could not be
    /// written to storage. The turn still succeeded.
    pub persistence_warning: Option<MemoryError>,
}

/// Why a turn produced no reply. None of these mutate history.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("No model is configured")]
    ModelNotConfigured,

    #[error("Message too long: {tokens} tokens with an empty history, budget is {budget}")]
    OversizedTurn { tokens: usize, budget: usize },

    #[error("Inference failed: {0}")]
    Inference(#[from] ProviderError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

pub struct ChatService {
    assembler: PromptAssembler,
    provider: Arc<dyn Provider>,
    locks: SessionLocks,
    model: Option<String>,
    system_preamble: String,
    context_length: usize,
    temperature: f32,
    strip_reasoning: bool,
}

impl ChatService {
    /// Create a service with no model set and a 4096-token budget.
    pub fn new(assembler: PromptAssembler, provider: Arc<dyn Provider>) -> Self {
        Self {
            assembler,
            provider,
            locks: SessionLocks::new(),
            model: None,
            system_preamble: String::new(),
            context_length: 4096,
            temperature: 0.7,
            strip_reasoning: true,
        }
    }

    /// Create a service configured from the `[llm]` section.
    pub fn from_config(
        assembler: PromptAssembler,
        provider: Arc<dyn Provider>,
        llm: &LlmConfig,
    ) -> Self {
        let mut service = Self::new(assembler, provider)
            .with_system_preamble(llm.system_preamble())
            .with_context_length(llm.context_length)
            .with_temperature(llm.temperature)
            .with_reasoning_stripped(llm.strip_reasoning);
        service.model = llm.model.clone();
        service
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.system_preamble = preamble.into();
        self
    }

    /// Set the token budget for assembled prompts.
    pub fn with_context_length(mut self, tokens: usize) -> Self {
        self.context_length = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Strip `<think>` reasoning from replies before recording them.
    pub fn with_reasoning_stripped(mut self, enabled: bool) -> Self {
        self.strip_reasoning = enabled;
        self
    }

    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Answer `user_text` for `key`, remembering the exchange on success.
    pub async fn handle_turn(
        &self,
        key: SessionKey,
        user_text: &str,
    ) -> Result<TurnReply, TurnError> {
        let model = self.model.as_deref().ok_or(TurnError::ModelNotConfigured)?;

        let _guard = self.locks.acquire(key).await;
        info!(group = key.group, participant = key.participant, "Handling turn");

        let prompt = self
            .assembler
            .build_and_fit(key, &self.system_preamble, user_text, self.context_length)
            .await?;

        if prompt.oversized {
            return Err(TurnError::OversizedTurn {
                tokens: prompt.token_count,
                budget: prompt.budget,
            });
        }

        let mut request = ProviderRequest::new(model, prompt.messages);
        request.temperature = self.temperature;

        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(
                group = key.group,
                participant = key.participant,
                error = %e,
                "Inference failed"
            );
            e
        })?;

        let content = if self.strip_reasoning {
            strip_reasoning(&response.message.content)
        } else {
            response.message.content
        };

        let recorded = self.assembler.record_exchange(key, user_text, &content).await;
        let persistence_warning = match recorded {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    group = key.group,
                    participant = key.participant,
                    error = %e,
                    "Exchange kept in memory but not persisted"
                );
                Some(e)
            }
        };

        debug!(
            group = key.group,
            participant = key.participant,
            model = %response.model,
            prompt_tokens = prompt.token_count,
            trims = prompt.trims,
            "Turn complete"
        );

        Ok(TurnReply {
            content,
            prompt_tokens: prompt.token_count,
            trims: prompt.trims,
            persistence_warning,
        })
    }
}
