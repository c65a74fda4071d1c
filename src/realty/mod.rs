//! Three-step property valuation pipeline: research, valuation, report.
//!
//! ```text
//! market_researcher ──route──▶ valuation_analyst
//! valuation_analyst ──route──▶ client_presenter
//! client_presenter  ──route──▶ END
//! ```
//!
//! Every step absorbs its external-call failures, so a run always ends with
//! all three outputs present. Steps that fell back are listed in
//! [`RealtyState::degraded`].

mod prompts;
mod router;
mod state;
mod steps;

pub use prompts::{DEFAULT_QUERY, FALLBACK_REPORT};
pub use router::route_realty;
pub use state::{Payload, RealtyState, RealtyUpdate, TraceEntry, TraceKind, TraceMetadata};
pub use steps::{ClientPresenter, MAX_TOOL_ROUNDS, MarketResearcher, ValuationAnalyst, tool_query};

use crate::{Ctx, Route, Runner, StepError, Workflow, WorkflowError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealtyStep {
    Researcher,
    Analyst,
    Presenter,
}

impl fmt::Display for RealtyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Researcher => "market_researcher",
            Self::Analyst => "valuation_analyst",
            Self::Presenter => "client_presenter",
        })
    }
}

pub fn build_workflow() -> Result<Workflow<RealtyState, RealtyStep>, WorkflowError> {
    use RealtyStep::*;

    Workflow::builder("realty")
        .register(Researcher, MarketResearcher::new())
        .register(Analyst, ValuationAnalyst)
        .register(Presenter, ClientPresenter)
        .start_at(Researcher)
        // each step fills its own output, so the router can only move forward
        .route(Researcher, route_realty, [Route::To(Analyst)])
        .route(Analyst, route_realty, [Route::To(Presenter)])
        .route(Presenter, route_realty, [Route::End])
        .build()
}

/// Run the pipeline against the services attached to `ctx`.
pub fn run(state: RealtyState, ctx: &mut Ctx) -> Result<RealtyState, StepError> {
    let mut runner = Runner::new(build_workflow()?).with_tracing();
    runner.run(state, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatResponse;
    use crate::testing::{ScriptedModel, ScriptedSearch, query_call};
    use serde_json::json;

    #[test]
    fn full_run_fills_every_output() {
        let model = ScriptedModel::new()
            .reply(ChatResponse::tool_calls(vec![query_call("c1", "Austin market")]))
            .reply(ChatResponse::text(r#"{"market_trends": "rising"}"#))
            .reply(ChatResponse::text(r#"{"base_valuation": 510000}"#))
            .reply(ChatResponse::text("# Base Valuation\n$510,000"));
        let search = ScriptedSearch::ok(json!([{"url": "u", "content": "c"}]));
        let mut ctx = Ctx::new().with_llm(model.clone()).with_search(search);

        let state = run(
            RealtyState::new("1 Main St, Austin TX").with_details(json!({"sqft": 1800})),
            &mut ctx,
        )
        .unwrap();

        assert_eq!(
            state.research_data,
            Some(Payload::Parsed(json!({"market_trends": "rising"})))
        );
        assert_eq!(
            state.valuation_data,
            Some(Payload::Parsed(json!({"base_valuation": 510000})))
        );
        assert_eq!(state.final_report.as_deref(), Some("# Base Valuation\n$510,000"));
        assert_eq!(
            state.log,
            vec![
                "MarketResearcher: start",
                "MarketResearcher: complete",
                "ValuationAnalyst: start",
                "ValuationAnalyst: complete",
                "ClientPresenter: start",
                "ClientPresenter: complete",
            ]
        );
        // two researcher rounds, one tool result, analyst, presenter
        assert_eq!(state.trace.len(), 5);
        assert!(!state.is_degraded());
        assert_eq!(model.requests().len(), 4);
    }

    #[test]
    fn run_without_services_degrades_but_completes() {
        let state = run(RealtyState::new("nowhere"), &mut Ctx::new()).unwrap();

        assert!(state.research_data.as_ref().unwrap().is_error());
        assert!(state.valuation_data.as_ref().unwrap().is_error());
        assert_eq!(state.final_report.as_deref(), Some(FALLBACK_REPORT));
        assert_eq!(
            state.degraded,
            vec!["MarketResearcher", "ValuationAnalyst", "ClientPresenter"]
        );
        assert_eq!(state.log.len(), 6);
        assert!(state.trace.is_empty());
    }

    #[test]
    fn each_step_declares_only_its_successor() {
        let wf = build_workflow().unwrap();
        assert_eq!(
            wf.targets(RealtyStep::Researcher),
            vec![Route::To(RealtyStep::Analyst)]
        );
        assert_eq!(
            wf.targets(RealtyStep::Analyst),
            vec![Route::To(RealtyStep::Presenter)]
        );
        assert_eq!(wf.targets(RealtyStep::Presenter), vec![Route::End]);
    }

    #[test]
    fn state_serializes_for_json_output() {
        let state = run(RealtyState::new("x").with_scenario("rates +1%"), &mut Ctx::new()).unwrap();
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["property_address"], "x");
        assert_eq!(value["simulation_scenario"], "rates +1%");
        assert!(value["research_data"]["error"].is_string());
    }
}
