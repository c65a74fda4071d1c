use crate::ctx::Ctx;
use crate::workflow::WorkflowError;
use thiserror::Error;

/// The result of running a step: a partial update to merge into the state.
pub type StepResult<S> = Result<<S as State>::Update, StepError>;

/// A workflow state that absorbs partial updates.
///
/// `apply` is a field merge: fields the update leaves unset keep their
/// current value, and append-only fields only ever grow.
pub trait State: Clone + 'static {
    /// The partial update a step returns.
    type Update;

    /// Merge `update` into this state and return the result.
    fn apply(self, update: Self::Update) -> Self;
}

/// A sync agent that performs one step of a workflow.
///
/// Implement this trait on your own structs and register them into a
/// [`crate::Workflow`] under a step id. Routing is decided by the workflow's
/// edges, not by the agent.
pub trait Agent<S: State>: Send + 'static {
    /// Display name used in the run log and in tracing events.
    fn name(&self) -> &'static str;

    /// Run one step against the current state and return the update to merge.
    fn run(&mut self, state: &S, ctx: &mut Ctx) -> StepResult<S>;
}

/// The "<step>: start" / "<step>: complete" pair every step appends to its
/// run log.
#[derive(Debug)]
pub struct StepLog {
    label: &'static str,
    entries: Vec<String>,
}

impl StepLog {
    /// Open the bracket with a "start" entry.
    pub fn start(label: &'static str) -> Self {
        tracing::debug!(step = label, "step start");
        Self {
            label,
            entries: vec![format!("{label}: start")],
        }
    }

    /// Close the bracket and return the entries to append.
    pub fn complete(mut self) -> Vec<String> {
        tracing::debug!(step = self.label, "step complete");
        self.entries.push(format!("{}: complete", self.label));
        self.entries
    }
}

/// Error type for agent steps and the runner, with variants designed around
/// what the caller can do about them.
#[derive(Debug, Error)]
pub enum StepError {
    /// Bad input, bad wiring or agent logic error. Don't retry, fix the code.
    #[error("invalid: {0}")]
    Invalid(String),
    /// Transient failure (network, rate limit). Retrying might help.
    #[error("transient: {0}")]
    Transient(String),
    /// The runner gave up, e.g. the step limit was exceeded.
    #[error("failed: {0}")]
    Failed(String),
    /// Everything else. Inspect the message for details.
    #[error("{0}")]
    Other(String),
}

impl From<ureq::Error> for StepError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) if (400..500).contains(&code) && code != 429 => {
                StepError::Invalid(format!("http status: {code}"))
            }
            other => StepError::Transient(other.to_string()),
        }
    }
}

impl From<std::io::Error> for StepError {
    fn from(e: std::io::Error) -> Self {
        StepError::Other(e.to_string())
    }
}

impl From<serde_json::Error> for StepError {
    fn from(e: serde_json::Error) -> Self {
        StepError::Invalid(e.to_string())
    }
}

impl From<WorkflowError> for StepError {
    fn from(e: WorkflowError) -> Self {
        StepError::Invalid(e.to_string())
    }
}

impl StepError {
    /// Create an [`Invalid`](StepError::Invalid) error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        StepError::Invalid(msg.into())
    }

    /// Create an [`Other`](StepError::Other) error.
    pub fn other(msg: impl Into<String>) -> Self {
        StepError::Other(msg.into())
    }

    /// Create a [`Transient`](StepError::Transient) error.
    pub fn transient(msg: impl Into<String>) -> Self {
        StepError::Transient(msg.into())
    }

    /// Create a [`Failed`](StepError::Failed) error.
    pub fn failed(msg: impl Into<String>) -> Self {
        StepError::Failed(msg.into())
    }
}
