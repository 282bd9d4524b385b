//! Conversation-context storage for ctxkeeper.
//!
//! - [`ContextStore`]: the in-memory `group → participant → history` map
//! - [`FileStorage`]: one JSON file per participant on disk
//! - [`NoopStorage`]: persistence disabled
//! - [`Persistence`]: bulk load at startup, per-participant flush after a turn

pub mod file_backend;
pub mod noop;
pub mod persistence;
pub mod store;

pub use file_backend::FileStorage;
pub use noop::NoopStorage;
pub use persistence::{LoadReport, Persistence};
pub use store::ContextStore;
