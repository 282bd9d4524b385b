//! Shared test helpers: scripted providers and a predictable tokenizer.

use async_trait::async_trait;
use ctxkeeper_core::error::{ProviderError, TokenizerError};
use ctxkeeper_core::message::Message;
use ctxkeeper_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ctxkeeper_core::tokenizer::Tokenizer;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock provider that returns a sequence of scripted replies and keeps
/// every request it saw.
pub struct SequentialMockProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn failing() -> Self {
        Self::new(vec![Err(ProviderError::Network("connection refused".into()))])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        requests.push(request);

        let replies = self.replies.lock().unwrap();
        let reply = replies.get(call).cloned().unwrap_or_else(|| {
            panic!(
                "SequentialMockProvider: no more replies (call #{call}, have {})",
                replies.len()
            )
        })?;

        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// Counts one token per rendered line, i.e. one per message, and records
/// how often it was asked.
#[derive(Default)]
pub struct LineTokenizer {
    calls: AtomicUsize,
}

impl LineTokenizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tokenizer for LineTokenizer {
    fn name(&self) -> &str {
        "lines"
    }

    async fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.lines().count())
    }
}

/// A tokenizer whose vocabulary never loads.
pub struct FailingTokenizer;

#[async_trait]
impl Tokenizer for FailingTokenizer {
    fn name(&self) -> &str {
        "failing"
    }

    async fn count_tokens(&self, _text: &str) -> Result<usize, TokenizerError> {
        Err(TokenizerError::Unavailable("tokenizer.json not found".into()))
    }
}
