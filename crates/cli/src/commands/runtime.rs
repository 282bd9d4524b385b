//! Shared wiring: config, storage, tokenizer and provider from `AppConfig`.

use ctxkeeper_agent::{ChatService, HeuristicTokenizer, PromptAssembler};
use ctxkeeper_config::{AppConfig, TokenizerConfig, TokenizerKind};
use ctxkeeper_core::provider::Provider;
use ctxkeeper_core::tokenizer::Tokenizer;
use ctxkeeper_memory::{ContextStore, FileStorage, LoadReport, Persistence};
use ctxkeeper_providers::OpenAiCompatProvider;
use std::path::Path;
use std::sync::Arc;

pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn load_config(path: Option<&Path>) -> CmdResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// The context store with every durable record loaded into it.
pub struct Runtime {
    pub config: AppConfig,
    pub store: ContextStore,
    pub persistence: Persistence,
    pub report: LoadReport,
}

impl Runtime {
    pub async fn open(config_path: Option<&Path>) -> CmdResult<Self> {
        let config = load_config(config_path)?;
        let persistence = Persistence::new(Arc::new(FileStorage::new(&config.storage.path)));
        let store = ContextStore::new();
        let report = persistence.load_all(&store).await?;

        Ok(Self {
            config,
            store,
            persistence,
            report,
        })
    }

    pub fn chat_service(&self) -> CmdResult<ChatService> {
        let assembler = PromptAssembler::new(
            self.store.clone(),
            self.persistence.clone(),
            build_tokenizer(&self.config.tokenizer)?,
        );
        Ok(ChatService::from_config(
            assembler,
            build_provider(&self.config)?,
            &self.config.llm,
        ))
    }
}

pub fn build_provider(config: &AppConfig) -> CmdResult<Arc<dyn Provider>> {
    let provider =
        OpenAiCompatProvider::new("llm", &config.llm.api_url, config.llm.api_key.clone())?;
    Ok(Arc::new(provider))
}

pub fn build_tokenizer(config: &TokenizerConfig) -> CmdResult<Arc<dyn Tokenizer>> {
    match config.kind {
        TokenizerKind::Heuristic => Ok(Arc::new(HeuristicTokenizer)),
        #[cfg(feature = "local")]
        TokenizerKind::Huggingface => Ok(Arc::new(ctxkeeper_providers::HfTokenizer::from_hub(
            config.model.clone(),
        ))),
        #[cfg(not(feature = "local"))]
        TokenizerKind::Huggingface => Err(format!(
            "tokenizer.kind = \"huggingface\" ({}) needs a build with `--features local`",
            config.model
        )
        .into()),
    }
}
