use crate::State;
use serde::{Deserialize, Serialize};

/// A drafted plan. `revision` counts planner passes within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan: String,
    pub steps: Vec<String>,
    pub revision: u32,
}

/// The reviewer's verdict on one plan revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub approved: bool,
    pub notes: String,
    pub revision: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanState {
    pub task: String,
    pub plan: Option<Plan>,
    pub review: Option<Review>,
    pub approved: bool,
    /// Completed review cycles. Never decreases.
    pub attempts: u32,
    pub log: Vec<String>,
}

impl PlanState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Self::default()
        }
    }

    /// Whether the current plan revision has been reviewed.
    pub fn plan_reviewed(&self) -> bool {
        match (&self.plan, &self.review) {
            (Some(plan), Some(review)) => plan.revision == review.revision,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanUpdate {
    pub plan: Option<Plan>,
    pub review: Option<Review>,
    pub approved: Option<bool>,
    pub attempt_completed: bool,
    /// Entries to append to the run log.
    pub log: Vec<String>,
}

impl State for PlanState {
    type Update = PlanUpdate;

    fn apply(mut self, update: PlanUpdate) -> Self {
        if let Some(plan) = update.plan {
            self.plan = Some(plan);
        }
        if let Some(review) = update.review {
            self.review = Some(review);
        }
        if let Some(approved) = update.approved {
            self.approved = approved;
        }
        if update.attempt_completed {
            self.attempts += 1;
        }
        self.log.extend(update.log);
        self
    }
}
