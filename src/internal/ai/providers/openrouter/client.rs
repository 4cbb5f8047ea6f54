//! OpenRouter API client.

use std::fmt;

use crate::internal::ai::{
    client::{Client as GenericClient, CompletionClient, Provider},
    providers::openrouter::completion::Model,
};

/// Bearer-token provider for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenRouterProvider {
    api_key: String,
}

impl fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("api_key", &"***")
            .finish()
    }
}

impl OpenRouterProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl Provider for OpenRouterProvider {
    fn on_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header("X-Title", "Bono")
    }
}

/// OpenRouter client type.
pub type Client = GenericClient<OpenRouterProvider>;

impl Client {
    /// Creates a client with a custom base URL and API key.
    pub fn with_base_url(base_url: &str, api_key: String) -> Self {
        Self::new(base_url, OpenRouterProvider::new(api_key))
    }
}

impl CompletionClient for Client {
    type Model = Model;

    fn completion_model(&self, model: impl Into<String>) -> Model {
        Model::new(self.clone(), model)
    }
}
