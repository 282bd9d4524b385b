//! Inference backends and tokenizers for ctxkeeper.
//!
//! Providers implement `ctxkeeper_core::Provider`; the Hugging Face
//! tokenizer implements `ctxkeeper_core::Tokenizer` and is only built with
//! the `local` feature.

#[cfg(feature = "local")]
pub mod hf_tokenizer;
pub mod openai_compat;

#[cfg(feature = "local")]
pub use hf_tokenizer::HfTokenizer;
pub use openai_compat::OpenAiCompatProvider;
