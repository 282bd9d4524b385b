//! Turn handling for ctxkeeper.
//!
//! A turn runs as:
//!
//! 1. **Lock** the `(group, participant)` session
//! 2. **Fit** the prompt: system preamble + history + new message, trimming
//!    the oldest exchanges until it fits the token budget
//! 3. **Infer** via the configured provider
//! 4. **Record** the exchange in the context store and flush it to storage
//!
//! Nothing is recorded unless inference succeeds.

pub mod context;
pub mod reasoning;
pub mod service;
pub mod session_lock;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{AssemblyError, FittedPrompt, HeuristicTokenizer, PromptAssembler};
pub use reasoning::strip_reasoning;
pub use service::{ChatService, TurnError, TurnReply};
pub use session_lock::{SessionGuard, SessionLocks};
