//! # stars-llm
//!
//! Asks a language model how well a repository fits each of the user's
//! lists. The model is reached through the [`LlmBackend`] trait; the shipped
//! backend speaks the OpenAI chat-completions protocol.

mod backend;
mod error;
pub mod openai;
pub mod parse;
pub mod prompt;
pub mod scorer;

pub use backend::{CompletionOptions, LlmBackend};
pub use error::LlmError;
pub use openai::OpenAiBackend;
pub use scorer::{ScoreOutcome, Scorer, response_schema};
