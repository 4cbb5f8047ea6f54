//! Chat completion types shared by the agent loop and model providers.
//!
//! Messages use the OpenAI chat wire shape directly, since every endpoint
//! bono talks to (OpenRouter and other compatible gateways) speaks it.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::internal::ai::tools::ToolSpec;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HttpError: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JsonError: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("ProviderError: {0}")]
    ProviderError(String),

    #[error("ResponseError: {0}")]
    ResponseError(String),
}

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content,
            tool_calls,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Number of characters carried by the message, tool call arguments included.
    pub fn char_len(&self) -> usize {
        match self {
            Message::System { content } | Message::User { content } => content.chars().count(),
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let text = content.as_deref().map_or(0, |c| c.chars().count());
                let calls: usize = tool_calls
                    .iter()
                    .map(|call| call.function.name.len() + call.function.arguments.chars().count())
                    .sum();
                text + calls
            }
            Message::Tool { content, .. } => content.chars().count(),
        }
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

fn function_type() -> String {
    "function".to_string()
}

/// Name and raw JSON arguments of a function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System prompt placed ahead of the history.
    pub preamble: Option<String>,
    pub chat_history: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    /// The assistant message to store in history for this response.
    pub fn to_message(&self) -> Message {
        Message::assistant(self.text.clone(), self.tool_calls.clone())
    }
}

pub trait CompletionModel: Clone + Send + Sync + 'static {
    fn completion(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, CompletionError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let msg = Message::assistant(None, vec![ToolCall::new("c1", "read_file", "{}")]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "read_file");

        let tool = serde_json::to_value(Message::tool_result("c1", "ok")).unwrap();
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "c1");
    }

    #[test]
    fn test_assistant_without_tool_calls_parses() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"hi","refusal":null}"#).unwrap();
        assert_eq!(msg, Message::assistant(Some("hi".into()), Vec::new()));
    }

    #[test]
    fn test_char_len_counts_tool_arguments() {
        let msg = Message::assistant(Some("ab".into()), vec![ToolCall::new("1", "x", "{}")]);
        assert_eq!(msg.char_len(), 2 + 1 + 2);
    }
}
