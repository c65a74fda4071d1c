use crate::State;
use crate::StepError;
use crate::llm::ChatResponse;
use crate::tools::extract_json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Structured output of a research or valuation step.
///
/// Serializes as the bare parsed value, `{"raw": ...}` or `{"error": ...}`.
/// The shapes overlap, so there is no `Deserialize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Error { error: String },
    Raw { raw: String },
    Parsed(Value),
}

impl Payload {
    pub fn error(err: &StepError) -> Self {
        Payload::Error {
            error: err.to_string(),
        }
    }

    /// Strict JSON, otherwise the text wrapped under `raw`.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(text.trim()) {
            Ok(value) => Payload::Parsed(value),
            Err(_) => Payload::Raw {
                raw: text.to_string(),
            },
        }
    }

    /// Like [`Payload::parse`], but also digs JSON out of code fences or prose.
    pub fn parse_lenient(text: &str) -> Self {
        match extract_json(text) {
            Some(value) => Payload::Parsed(value),
            None => Payload::Raw {
                raw: text.to_string(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Payload::Error { .. })
    }

    pub fn to_value(&self) -> Value {
        match self {
            Payload::Error { error } => serde_json::json!({ "error": error }),
            Payload::Raw { raw } => serde_json::json!({ "raw": raw }),
            Payload::Parsed(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    AiMessage,
    ToolResult,
    Render,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    pub latency_ms: u64,
}

/// One external call made during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub agent: String,
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    pub content: Value,
    pub metadata: TraceMetadata,
    pub ts: DateTime<Utc>,
}

impl TraceEntry {
    fn model_call(agent: &str, kind: TraceKind, response: &ChatResponse, latency: Duration) -> Self {
        Self {
            agent: agent.to_string(),
            kind,
            tool: None,
            args: None,
            content: Value::String(response.content.clone()),
            metadata: TraceMetadata {
                model: (!response.model.is_empty()).then(|| response.model.clone()),
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
                total_tokens: response.usage.total_tokens,
                latency_ms: latency_ms(latency),
            },
            ts: Utc::now(),
        }
    }

    pub fn ai_message(agent: &str, response: &ChatResponse, latency: Duration) -> Self {
        Self::model_call(agent, TraceKind::AiMessage, response, latency)
    }

    pub fn render(agent: &str, response: &ChatResponse, latency: Duration) -> Self {
        Self::model_call(agent, TraceKind::Render, response, latency)
    }

    pub fn tool_result(agent: &str, tool: &str, query: &str, result: Value, latency: Duration) -> Self {
        Self {
            agent: agent.to_string(),
            kind: TraceKind::ToolResult,
            tool: Some(tool.to_string()),
            args: Some(serde_json::json!({ "query": query })),
            content: result,
            metadata: TraceMetadata {
                latency_ms: latency_ms(latency),
                ..TraceMetadata::default()
            },
            ts: Utc::now(),
        }
    }
}

fn latency_ms(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtyState {
    pub property_address: String,
    pub property_details: Value,
    pub simulation_scenario: Option<String>,
    pub research_data: Option<Payload>,
    pub valuation_data: Option<Payload>,
    pub final_report: Option<String>,
    pub log: Vec<String>,
    pub trace: Vec<TraceEntry>,
    /// Steps that completed on a fallback after an external-call failure.
    pub degraded: Vec<String>,
}

impl RealtyState {
    pub fn new(property_address: impl Into<String>) -> Self {
        Self {
            property_address: property_address.into(),
            property_details: Value::Object(Map::new()),
            simulation_scenario: None,
            research_data: None,
            valuation_data: None,
            final_report: None,
            log: Vec::new(),
            trace: Vec::new(),
            degraded: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.property_details = details;
        self
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.simulation_scenario = Some(scenario.into());
        self
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealtyUpdate {
    pub research_data: Option<Payload>,
    pub valuation_data: Option<Payload>,
    pub final_report: Option<String>,
    /// Entries to append to the run log.
    pub log: Vec<String>,
    /// Entries to append to the trace.
    pub trace: Vec<TraceEntry>,
    /// Set when the step fell back after a failed external call.
    pub degraded: Option<String>,
}

impl State for RealtyState {
    type Update = RealtyUpdate;

    fn apply(mut self, update: RealtyUpdate) -> Self {
        if let Some(research) = update.research_data {
            self.research_data = Some(research);
        }
        if let Some(valuation) = update.valuation_data {
            self.valuation_data = Some(valuation);
        }
        if let Some(report) = update.final_report {
            self.final_report = Some(report);
        }
        self.log.extend(update.log);
        self.trace.extend(update.trace);
        self.degraded.extend(update.degraded);
        self
    }
}
