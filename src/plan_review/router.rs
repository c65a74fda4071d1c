use super::state::PlanState;
use super::{MAX_ATTEMPTS, PlanStep};
use crate::Route;

/// Approval-gated loop: stop on approval or at the attempt ceiling,
/// otherwise draft, review, and redraft.
///
/// Reaching the ceiling is not a failure signal by itself; callers read
/// `approved` to tell the two endings apart.
pub fn route_plan(state: &PlanState) -> Route<PlanStep> {
    if state.approved || state.attempts >= MAX_ATTEMPTS {
        return Route::End;
    }
    if state.plan.is_none() {
        return Route::To(PlanStep::Planner);
    }
    if !state.plan_reviewed() {
        return Route::To(PlanStep::Reviewer);
    }
    Route::To(PlanStep::Planner)
}
