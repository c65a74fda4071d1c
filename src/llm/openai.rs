use super::{ChatModel, ChatRequest, ChatResponse, Message, ToolCall, ToolSpec, Usage};
use crate::config::LlmConfig;
use crate::tools::http_post_json;
use crate::StepError;
use serde_json::{Value, json};

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    config: LlmConfig,
}

impl OpenAiChat {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(LlmConfig::from_env())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl ChatModel for OpenAiChat {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, StepError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| StepError::invalid("OPENAI_API_KEY is not set"))?;

        let body = build_payload(request);
        let response = http_post_json(&self.endpoint(), Some(api_key), &body, self.config.timeout)?;
        parse_response(&response, &request.model)
    }
}

fn build_payload(request: &ChatRequest) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(message_json).collect();

    let mut payload = json!({
        "model": request.model,
        "messages": messages,
        "temperature": request.temperature,
    });

    if !request.tools.is_empty() {
        let tools: Vec<Value> = request.tools.iter().map(tool_json).collect();
        payload["tools"] = Value::Array(tools);
    }

    payload
}

fn message_json(message: &Message) -> Value {
    let mut value = json!({
        "role": message.role,
        "content": message.content,
    });

    if !message.tool_calls.is_empty() {
        let calls: Vec<Value> = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        // the wire format carries arguments as a JSON string
                        "arguments": call.args.to_string(),
                    },
                })
            })
            .collect();
        value["tool_calls"] = Value::Array(calls);
    }

    if let Some(id) = &message.tool_call_id {
        value["tool_call_id"] = json!(id);
    }

    value
}

fn tool_json(tool: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        },
    })
}

fn parse_response(body: &Value, requested_model: &str) -> Result<ChatResponse, StepError> {
    let message = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| StepError::invalid("chat completion response has no choices"))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| calls.iter().filter_map(parse_tool_call).collect())
        .unwrap_or_default();

    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(requested_model)
        .to_string();

    Ok(ChatResponse {
        content,
        tool_calls,
        usage: body.get("usage").map(Usage::from_json).unwrap_or_default(),
        model,
    })
}

fn parse_tool_call(call: &Value) -> Option<ToolCall> {
    let function = call.get("function")?;
    let name = function.get("name")?.as_str()?.to_string();
    let args = match function.get("arguments") {
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).unwrap_or_else(|_| json!({ "input": raw }))
        }
        Some(other) => other.clone(),
        None => json!({}),
    };
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(ToolCall { id, name, args })
}
