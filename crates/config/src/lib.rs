//! Configuration loading, validation, and management for ctxkeeper.
//!
//! Loads configuration from `~/.ctxkeeper/config.toml` (or an explicit
//! path) with environment variable overrides. Validates all settings at
//! startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model, endpoint and prompt settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Token counting settings
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Durable history storage
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model to chat with. Unset means every turn fails with a
    /// configuration error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// System preamble, one entry per line
    #[serde(default = "default_pre_prompt")]
    pub pre_prompt: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on the assembled prompt, in tokens
    #[serde(default = "default_context_length")]
    pub context_length: usize,

    /// Drop `<think>...</think>` reasoning from replies
    #[serde(default = "default_true")]
    pub strip_reasoning: bool,
}

fn default_api_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_pre_prompt() -> Vec<String> {
    vec![
        "You are a friendly assistant chatting with people in a group.".into(),
        "Keep answers short and conversational.".into(),
    ]
}
fn default_temperature() -> f32 {
    0.7
}
fn default_context_length() -> usize {
    4096
}
fn default_true() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: None,
            api_url: default_api_url(),
            api_key: None,
            pre_prompt: default_pre_prompt(),
            temperature: default_temperature(),
            context_length: default_context_length(),
            strip_reasoning: true,
        }
    }
}

impl LlmConfig {
    /// The system preamble: `pre_prompt` lines joined with newlines.
    pub fn system_preamble(&self) -> String {
        self.pre_prompt.join("\n")
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("pre_prompt", &self.pre_prompt)
            .field("temperature", &self.temperature)
            .field("context_length", &self.context_length)
            .field("strip_reasoning", &self.strip_reasoning)
            .finish()
    }
}

/// Which token counter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// ~4 characters per token, no vocabulary needed
    Heuristic,
    /// A `tokenizer.json` fetched from the Hugging Face hub
    Huggingface,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_tokenizer_kind")]
    pub kind: TokenizerKind,

    /// Hub repository holding `tokenizer.json`
    #[serde(default = "default_tokenizer_model")]
    pub model: String,
}

fn default_tokenizer_kind() -> TokenizerKind {
    TokenizerKind::Heuristic
}
fn default_tokenizer_model() -> String {
    "deepseek-ai/DeepSeek-R1".into()
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: default_tokenizer_kind(),
            model: default_tokenizer_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the `<group>/<participant>.json` tree
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./database")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ctxkeeper/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides:
    /// - `CTXKEEPER_MODEL`
    /// - `CTXKEEPER_API_URL`
    /// - `CTXKEEPER_API_KEY`
    /// - `CTXKEEPER_STORAGE_PATH`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(model) = std::env::var("CTXKEEPER_MODEL") {
            config.llm.model = Some(model);
        }
        if let Ok(url) = std::env::var("CTXKEEPER_API_URL") {
            config.llm.api_url = url;
        }
        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var("CTXKEEPER_API_KEY").ok();
        }
        if let Ok(path) = std::env::var("CTXKEEPER_STORAGE_PATH") {
            config.storage.path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ctxkeeper")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.llm.context_length == 0 {
            return Err(ConfigError::ValidationError(
                "llm.context_length must be > 0".into(),
            ));
        }

        if self.llm.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "llm.model must not be blank (omit it instead)".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
