//! In-process fakes for the external services.

use crate::StepError;
use crate::llm::{ChatModel, ChatRequest, ChatResponse, ToolCall};
use crate::tools::SearchTool;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays queued responses in order and records every request it sees.
/// Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<Result<ChatResponse, String>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, response: ChatResponse) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatModel for ScriptedModel {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, StepError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(StepError::transient(message)),
            None => Err(StepError::transient("script exhausted")),
        }
    }
}

/// Answers every query with the same payload, or fails every call.
#[derive(Clone)]
pub struct ScriptedSearch {
    result: Result<Value, String>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSearch {
    pub fn ok(result: Value) -> Self {
        Self {
            result: Ok(result),
            queries: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl SearchTool for ScriptedSearch {
    fn search(&self, query: &str) -> Result<Value, StepError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.result.clone().map_err(StepError::transient)
    }
}

pub fn search_call(id: &str, args: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: crate::tools::SEARCH_TOOL_NAME.to_string(),
        args,
    }
}

pub fn query_call(id: &str, query: &str) -> ToolCall {
    search_call(id, json!({ "query": query }))
}
