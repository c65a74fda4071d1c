use super::prompts::{
    ANALYST_SYSTEM, DEFAULT_QUERY, FALLBACK_REPORT, PRESENTER_SYSTEM, RESEARCHER_SYSTEM,
    analyst_user, presenter_user, researcher_user,
};
use super::state::{Payload, RealtyState, RealtyUpdate, TraceEntry};
use crate::llm::Message;
use crate::{Agent, Ctx, StepError, StepLog, StepResult};
use serde_json::{Value, json};
use std::time::Instant;

/// Model rounds the researcher's tool loop may take.
pub const MAX_TOOL_ROUNDS: usize = 3;

/// Resolve the search query from tool-call arguments.
pub fn tool_query(args: &Value) -> String {
    ["query", "input"]
        .iter()
        .find_map(|key| {
            args.get(*key)
                .and_then(Value::as_str)
                .filter(|query| !query.trim().is_empty())
        })
        .unwrap_or(DEFAULT_QUERY)
        .to_string()
}

fn to_json_text(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Gathers market data through a bounded tool-use loop.
pub struct MarketResearcher {
    max_rounds: usize,
}

impl MarketResearcher {
    pub fn new() -> Self {
        Self {
            max_rounds: MAX_TOOL_ROUNDS,
        }
    }

    fn research(
        &self,
        state: &RealtyState,
        ctx: &Ctx,
        trace: &mut Vec<TraceEntry>,
    ) -> Result<Payload, StepError> {
        let mut messages = vec![
            Message::system(RESEARCHER_SYSTEM),
            Message::user(researcher_user(&state.property_address)),
        ];
        let tools: Vec<_> = ctx.search_spec().into_iter().collect();
        let mut last_content = String::new();

        for round in 1..=self.max_rounds {
            let started = Instant::now();
            let response = ctx
                .llm()
                .messages(messages.iter().cloned())
                .tools(tools.iter().cloned())
                .complete()?;
            trace.push(TraceEntry::ai_message(self.name(), &response, started.elapsed()));
            last_content = response.content.clone();

            if !response.wants_tools() {
                break;
            }
            if round == self.max_rounds {
                // the round budget is spent; pending calls are dropped
                tracing::warn!(
                    round,
                    pending = response.tool_calls.len(),
                    "tool round limit reached, using last content"
                );
                break;
            }

            messages.push(Message::assistant(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let query = tool_query(&call.args);
                tracing::info!(tool = %call.name, %query, "executing tool");

                let started = Instant::now();
                let result = ctx.search(&query).unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "search failed");
                    json!({ "error": err.to_string() })
                });
                trace.push(TraceEntry::tool_result(
                    self.name(),
                    &call.name,
                    &query,
                    result.clone(),
                    started.elapsed(),
                ));
                messages.push(Message::tool(call.id.clone(), result.to_string()));
            }
        }

        let final_text = if last_content.trim().is_empty() {
            "{}"
        } else {
            last_content.as_str()
        };
        Ok(Payload::parse(final_text))
    }
}

impl Default for MarketResearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent<RealtyState> for MarketResearcher {
    fn name(&self) -> &'static str {
        "MarketResearcher"
    }

    fn run(&mut self, state: &RealtyState, ctx: &mut Ctx) -> StepResult<RealtyState> {
        let log = StepLog::start(self.name());
        let mut trace = Vec::new();

        let research = self
            .research(state, ctx, &mut trace)
            .unwrap_or_else(|err| {
                tracing::warn!(step = self.name(), error = %err, "research failed");
                Payload::error(&err)
            });
        let degraded = research.is_error().then(|| self.name().to_string());

        Ok(RealtyUpdate {
            research_data: Some(research),
            log: log.complete(),
            trace,
            degraded,
            ..RealtyUpdate::default()
        })
    }
}

/// Turns research into a structured valuation with one model call.
pub struct ValuationAnalyst;

impl Agent<RealtyState> for ValuationAnalyst {
    fn name(&self) -> &'static str {
        "ValuationAnalyst"
    }

    fn run(&mut self, state: &RealtyState, ctx: &mut Ctx) -> StepResult<RealtyState> {
        let log = StepLog::start(self.name());
        let mut trace = Vec::new();

        let research = state
            .research_data
            .as_ref()
            .map_or_else(|| json!({}), Payload::to_value);
        let prompt = analyst_user(
            &to_json_text(&state.property_details),
            &to_json_text(&research),
            state.simulation_scenario.as_deref().unwrap_or_default(),
        );

        let started = Instant::now();
        let valuation = match ctx.llm().system(ANALYST_SYSTEM).user(prompt).complete() {
            Ok(response) => {
                trace.push(TraceEntry::ai_message(self.name(), &response, started.elapsed()));
                Payload::parse_lenient(&response.content)
            }
            Err(err) => {
                tracing::warn!(step = self.name(), error = %err, "valuation failed");
                Payload::error(&err)
            }
        };
        let degraded = valuation.is_error().then(|| self.name().to_string());

        Ok(RealtyUpdate {
            valuation_data: Some(valuation),
            log: log.complete(),
            trace,
            degraded,
            ..RealtyUpdate::default()
        })
    }
}

/// Renders the valuation as a client-facing Markdown report.
pub struct ClientPresenter;

impl Agent<RealtyState> for ClientPresenter {
    fn name(&self) -> &'static str {
        "ClientPresenter"
    }

    fn run(&mut self, state: &RealtyState, ctx: &mut Ctx) -> StepResult<RealtyState> {
        let log = StepLog::start(self.name());
        let mut trace = Vec::new();

        let valuation = state
            .valuation_data
            .as_ref()
            .map_or_else(|| json!({}), Payload::to_value);

        let started = Instant::now();
        let request = ctx
            .llm()
            .temperature(0.0)
            .system(PRESENTER_SYSTEM)
            .user(presenter_user(&to_json_text(&valuation)));

        let (report, degraded) = match request.complete() {
            Ok(response) => {
                trace.push(TraceEntry::render(self.name(), &response, started.elapsed()));
                (response.content, None)
            }
            Err(err) => {
                tracing::warn!(step = self.name(), error = %err, "report rendering failed");
                (FALLBACK_REPORT.to_string(), Some(self.name().to_string()))
            }
        };

        Ok(RealtyUpdate {
            final_report: Some(report),
            log: log.complete(),
            trace,
            degraded,
            ..RealtyUpdate::default()
        })
    }
}
