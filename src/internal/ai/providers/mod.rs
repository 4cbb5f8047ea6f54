//! Model providers.

pub mod openrouter;
