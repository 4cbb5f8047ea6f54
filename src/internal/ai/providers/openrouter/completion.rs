//! Chat completion over the OpenAI-compatible `/chat/completions` endpoint.

use serde::{Deserialize, Serialize};

use crate::internal::ai::{
    completion::{
        CompletionError, CompletionModel, CompletionRequest, CompletionResponse, Message, ToolCall,
    },
    providers::openrouter::client::Client,
    tools::ToolSpec,
};

#[derive(Clone, Debug)]
pub struct Model {
    client: Client,
    model: String,
}

impl Model {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

// ================================================================
// Wire types
// ================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolSpec],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

fn build_messages(request: &CompletionRequest) -> Vec<Message> {
    let mut messages = Vec::with_capacity(request.chat_history.len() + 1);
    if let Some(preamble) = &request.preamble {
        messages.push(Message::system(preamble.clone()));
    }
    messages.extend(request.chat_history.iter().cloned());
    messages
}

fn parse_response(body: &str) -> Result<CompletionResponse, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::ResponseError("No choices in response".to_string()))?;

    let text = choice
        .message
        .content
        .filter(|text| !text.trim().is_empty());

    Ok(CompletionResponse {
        text,
        tool_calls: choice.message.tool_calls,
    })
}

fn parse_error(body: &str) -> CompletionError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(error_response) => CompletionError::ProviderError(error_response.error.message),
        Err(_) => CompletionError::ProviderError(body.to_string()),
    }
}

impl CompletionModel for Model {
    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(&request),
            temperature: request.temperature,
            tools: &request.tools,
            tool_choice: (!request.tools.is_empty()).then_some("auto"),
        };

        let response = self
            .client
            .post("chat/completions")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, model = %self.model, "completion request failed");
            return Err(parse_error(&response_text));
        }

        parse_response(&response_text)
    }
}
