//! HTTP plumbing shared by completion providers.

use std::time::Duration;

use reqwest::{Client as HttpClient, RequestBuilder};

use crate::internal::ai::completion::CompletionModel;

/// Applied to every provider call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-provider request decoration, typically authentication.
pub trait Provider: Send + Sync {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

/// Base URL plus a shared HTTP client, parameterised by the provider that signs requests.
#[derive(Clone, Debug)]
pub struct Client<P> {
    base_url: String,
    http_client: HttpClient,
    provider: P,
}

impl<P: Provider> Client<P> {
    pub fn new(base_url: &str, provider: P) -> Self {
        let http_client = HttpClient::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to an HTTP client without timeout");
                HttpClient::new()
            });

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            provider,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// A signed POST to `path` under the base URL.
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.provider.on_request(self.http_client.post(self.endpoint(path)))
    }
}

/// Clients that can hand out completion models by name.
pub trait CompletionClient {
    type Model: CompletionModel;

    fn completion_model(&self, model: impl Into<String>) -> Self::Model;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoAuth;
    impl Provider for NoAuth {}

    #[test]
    fn test_endpoint_joins_cleanly() {
        let client = Client::new("https://example.com/api/v1/", NoAuth);
        assert_eq!(client.base_url(), "https://example.com/api/v1");
        assert_eq!(
            client.endpoint("/chat/completions"),
            "https://example.com/api/v1/chat/completions"
        );
        assert_eq!(
            client.endpoint("chat/completions"),
            "https://example.com/api/v1/chat/completions"
        );
    }
}
