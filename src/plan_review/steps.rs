use super::state::{Plan, PlanState, PlanUpdate, Review};
use crate::{Agent, Ctx, StepLog, StepResult};

/// The token a plan must mention to pass review.
pub const TASK_TOKEN: &str = "task";

/// Minimum number of steps an approvable plan lists.
pub const MIN_PLAN_STEPS: usize = 3;

const DEFAULT_STEPS: [&str; 3] = [
    "Identify requirements",
    "Propose a solution",
    "Validate constraints",
];

const APPROVED_NOTES: &str = "Looks good.";
const REJECTED_NOTES: &str = "Needs more detail (at least 3 steps + mention task).";

/// Drafts a fixed-shape plan titled after the task.
pub struct Planner {
    steps: Vec<String>,
}

impl Planner {
    pub fn new() -> Self {
        Self::with_steps(DEFAULT_STEPS)
    }

    pub fn with_steps<I, T>(steps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent<PlanState> for Planner {
    fn name(&self) -> &'static str {
        "Planner"
    }

    fn run(&mut self, state: &PlanState, _ctx: &mut Ctx) -> StepResult<PlanState> {
        let log = StepLog::start(self.name());

        let revision = state.plan.as_ref().map_or(0, |plan| plan.revision) + 1;
        let plan = Plan {
            plan: format!("Plan for task: {}", state.task),
            steps: self.steps.clone(),
            revision,
        };
        tracing::debug!(revision, steps = plan.steps.len(), "plan drafted");

        Ok(PlanUpdate {
            plan: Some(plan),
            log: log.complete(),
            ..PlanUpdate::default()
        })
    }
}

/// Acceptance rule: the plan mentions the task and lists enough steps.
pub fn approves(plan: &Plan) -> bool {
    plan.plan.to_lowercase().contains(TASK_TOKEN) && plan.steps.len() >= MIN_PLAN_STEPS
}

pub struct Reviewer;

impl Agent<PlanState> for Reviewer {
    fn name(&self) -> &'static str {
        "Reviewer"
    }

    fn run(&mut self, state: &PlanState, _ctx: &mut Ctx) -> StepResult<PlanState> {
        let log = StepLog::start(self.name());

        // no plan yet reads as an empty one
        let (approved, revision) = match &state.plan {
            Some(plan) => (approves(plan), plan.revision),
            None => (false, 0),
        };
        let notes = if approved { APPROVED_NOTES } else { REJECTED_NOTES };
        tracing::debug!(revision, approved, "plan reviewed");

        Ok(PlanUpdate {
            review: Some(Review {
                approved,
                notes: notes.to_string(),
                revision,
            }),
            approved: Some(approved),
            log: log.complete(),
            ..PlanUpdate::default()
        })
    }
}

/// Counts one completed review cycle. Wired directly after [`Reviewer`].
pub struct AttemptCounter;

impl Agent<PlanState> for AttemptCounter {
    fn name(&self) -> &'static str {
        "AttemptCounter"
    }

    fn run(&mut self, _state: &PlanState, _ctx: &mut Ctx) -> StepResult<PlanState> {
        let log = StepLog::start(self.name());
        Ok(PlanUpdate {
            attempt_completed: true,
            log: log.complete(),
            ..PlanUpdate::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::State;

    fn plan(text: &str, steps: &[&str]) -> Plan {
        Plan {
            plan: text.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            revision: 1,
        }
    }

    #[test]
    fn approves_plan_with_task_and_three_steps() {
        assert!(approves(&plan("Plan for task: X", &["a", "b", "c"])));
    }

    #[test]
    fn rejects_plan_with_one_step() {
        assert!(!approves(&plan("Plan for task: X", &["a"])));
    }

    #[test]
    fn rejects_plan_without_task_token() {
        assert!(!approves(&plan("Plan for X", &["a", "b", "c"])));
    }

    #[test]
    fn task_token_is_case_insensitive() {
        assert!(approves(&plan("TASK breakdown", &["a", "b", "c", "d"])));
    }

    #[test]
    fn planner_titles_plan_and_bumps_revision() {
        let mut ctx = Ctx::new();
        let state = PlanState::new("Write a report");

        let update = Planner::new().run(&state, &mut ctx).unwrap();
        let first = state.apply(update);
        let plan = first.plan.clone().unwrap();
        assert_eq!(plan.plan, "Plan for task: Write a report");
        assert_eq!(plan.steps, DEFAULT_STEPS);
        assert_eq!(plan.revision, 1);
        assert_eq!(first.log, vec!["Planner: start", "Planner: complete"]);

        let update = Planner::new().run(&first, &mut ctx).unwrap();
        let second = first.apply(update);
        assert_eq!(second.plan.unwrap().revision, 2);
    }

    #[test]
    fn reviewer_emits_verdict_for_current_revision() {
        let mut ctx = Ctx::new();
        let state = PlanState {
            plan: Some(plan("Plan for task: X", &["a"])),
            ..PlanState::new("X")
        };

        let update = Reviewer.run(&state, &mut ctx).unwrap();
        assert_eq!(update.approved, Some(false));
        let review = update.review.unwrap();
        assert_eq!(review.notes, REJECTED_NOTES);
        assert_eq!(review.revision, 1);
        assert_eq!(update.log, vec!["Reviewer: start", "Reviewer: complete"]);
    }

    #[test]
    fn reviewer_without_plan_rejects() {
        let mut ctx = Ctx::new();
        let update = Reviewer.run(&PlanState::new("X"), &mut ctx).unwrap();
        assert_eq!(update.approved, Some(false));
    }

    #[test]
    fn attempt_counter_increments_once() {
        let mut ctx = Ctx::new();
        let state = PlanState::new("X");
        let update = AttemptCounter.run(&state, &mut ctx).unwrap();
        let next = state.apply(update);
        assert_eq!(next.attempts, 1);
    }
}
