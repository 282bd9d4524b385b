//! Budgeted prompt assembly.
//!
//! A prompt is `[system] + history + [user]`, measured with the configured
//! [`Tokenizer`](ctxkeeper_core::tokenizer::Tokenizer) and trimmed one
//! exchange at a time, oldest first, until it fits.

pub mod assembler;
pub mod token;

pub use assembler::{AssemblyError, FittedPrompt, PromptAssembler};
pub use token::{HeuristicTokenizer, estimate_tokens, render_for_count};
