//! OpenRouter (and any OpenAI-compatible gateway) provider.
//!
//! # Example
//! ```no_run
//! use bono::internal::ai::client::CompletionClient;
//! use bono::internal::ai::providers::openrouter;
//!
//! let client = openrouter::Client::with_base_url(openrouter::DEFAULT_BASE_URL, "sk-or-...".into());
//! let model = client.completion_model(openrouter::DEFAULT_MODEL);
//! ```

pub mod client;
pub mod completion;

pub use client::{Client, OpenRouterProvider};
pub use completion::Model;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
