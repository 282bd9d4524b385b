//! # ctxkeeper Core
//!
//! Domain types, traits, and error definitions for the ctxkeeper
//! conversation-context store. This crate has **no runtime dependencies**
//! beyond serde, thiserror and async-trait: it defines the domain model
//! that every other crate implements against.
//!
//! ## Boundaries
//!
//! Each external collaborator is a trait here, with implementations in
//! their own crates:
//! - [`Provider`]: the inference backend (`chat(model, messages)`)
//! - [`Tokenizer`]: model-specific token counting
//! - [`SessionStorage`]: durable per-participant history records

pub mod error;
pub mod message;
pub mod provider;
pub mod storage;
pub mod tokenizer;

// Re-export key types at crate root for ergonomics
pub use error::{MemoryError, ProviderError, TokenizerError};
pub use message::{GroupId, Message, ParticipantId, Role, SessionKey};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use storage::{PersistedSession, SessionStorage, StorageLoad};
pub use tokenizer::Tokenizer;
