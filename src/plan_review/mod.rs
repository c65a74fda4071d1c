//! Planner/reviewer loop gated on approval.
//!
//! ```text
//! planner ──route──▶ planner | reviewer | END
//! reviewer ────────▶ attempt_counter
//! attempt_counter ──route──▶ planner | reviewer | END
//! ```
//!
//! The loop ends once a plan is approved or after [`MAX_ATTEMPTS`] review
//! cycles, whichever comes first.

mod router;
mod state;
mod steps;

pub use router::route_plan;
pub use state::{Plan, PlanState, PlanUpdate, Review};
pub use steps::{AttemptCounter, MIN_PLAN_STEPS, Planner, Reviewer, TASK_TOKEN, approves};

use crate::{Ctx, Route, Runner, StepError, Workflow, WorkflowError};
use std::fmt;

/// Review cycles allowed before the loop gives up.
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanStep {
    Planner,
    Reviewer,
    AttemptCounter,
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Planner => "planner",
            Self::Reviewer => "reviewer",
            Self::AttemptCounter => "attempt_counter",
        })
    }
}

pub fn build_workflow() -> Result<Workflow<PlanState, PlanStep>, WorkflowError> {
    build_workflow_with(Planner::new())
}

/// Same wiring as [`build_workflow`] with a caller-supplied planner.
pub fn build_workflow_with(
    planner: Planner,
) -> Result<Workflow<PlanState, PlanStep>, WorkflowError> {
    let targets = [
        Route::To(PlanStep::Planner),
        Route::To(PlanStep::Reviewer),
        Route::End,
    ];

    Workflow::builder("plan-review")
        .register(PlanStep::Planner, planner)
        .register(PlanStep::Reviewer, Reviewer)
        .register(PlanStep::AttemptCounter, AttemptCounter)
        .start_at(PlanStep::Planner)
        .route(PlanStep::Planner, route_plan, targets)
        .edge(PlanStep::Reviewer, PlanStep::AttemptCounter)
        .route(PlanStep::AttemptCounter, route_plan, targets)
        .build()
}

/// Run the loop for `task` to termination.
pub fn run(task: impl Into<String>) -> Result<PlanState, StepError> {
    let mut runner = Runner::new(build_workflow()?).with_tracing();
    runner.run(PlanState::new(task), &mut Ctx::new())
}
