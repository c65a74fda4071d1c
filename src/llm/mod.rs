//! Chat-completion types, the [`ChatModel`] seam and the request builder
//! returned by [`crate::Ctx::llm`].

mod openai;

pub use openai::OpenAiChat;

use crate::StepError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A role-tagged chat message.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool messages: the call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

/// A tool declaration bound to a request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl Usage {
    /// Read a provider `usage` object, accepting both the
    /// `prompt_tokens`/`completion_tokens` and `input_tokens`/`output_tokens`
    /// spellings.
    pub fn from_json(usage: &Value) -> Self {
        let input_tokens = token_count(usage, &["input_tokens", "prompt_tokens"]);
        let output_tokens = token_count(usage, &["output_tokens", "completion_tokens"]);
        let total_tokens = token_count(usage, &["total_tokens"]).or(match (input_tokens, output_tokens) {
            (Some(i), Some(o)) => Some(i + o),
            _ => None,
        });
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

fn token_count(usage: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|key| usage.get(*key).and_then(Value::as_u64))
        .and_then(|n| u32::try_from(n).ok())
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
}

/// A model reply: free text, tool calls, or both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
    pub model: String,
}

impl ChatResponse {
    /// A plain text reply, mostly useful for tests and fakes.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// A reply that only requests tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }

    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A blocking chat-completion backend.
pub trait ChatModel: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, StepError>;
}

/// Builder for one chat call, created by [`crate::Ctx::llm`].
///
/// ```rust,no_run
/// # use stepgraph::Ctx;
/// let ctx = Ctx::from_env();
/// let summary = ctx
///     .llm()
///     .system("You are terse.")
///     .user("Summarise the Rust ownership model.")
///     .send()?;
/// # Ok::<(), stepgraph::StepError>(())
/// ```
pub struct LlmRequest<'a> {
    model: Option<&'a dyn ChatModel>,
    request: ChatRequest,
}

impl<'a> LlmRequest<'a> {
    pub(crate) fn new(model: Option<&'a dyn ChatModel>, name: &str, temperature: f64) -> Self {
        Self {
            model,
            request: ChatRequest {
                model: name.to_string(),
                temperature,
                messages: Vec::new(),
                tools: Vec::new(),
            },
        }
    }

    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(Message::system(content));
        self
    }

    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(Message::user(content));
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.request.messages.extend(messages);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = ToolSpec>) -> Self {
        self.request.tools.extend(tools);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.request.temperature = temperature;
        self
    }

    /// The request as it would be sent.
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Send the request and return the full response.
    pub fn complete(self) -> Result<ChatResponse, StepError> {
        let model = self
            .model
            .ok_or_else(|| StepError::invalid("no chat model configured"))?;
        tracing::info!(
            model = %self.request.model,
            messages = self.request.messages.len(),
            tools = self.request.tools.len(),
            "chat completion"
        );
        model.complete(&self.request)
    }

    /// Send the request and return only the text content.
    pub fn send(self) -> Result<String, StepError> {
        Ok(self.complete()?.content)
    }
}
