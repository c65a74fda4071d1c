use crate::workflow::{Route, StepId};
use crate::{Ctx, State, StepError, Workflow};
use std::time::{Duration, Instant};

/// Passed to the `on_step` hook after each step's update has been merged.
pub struct StepEvent<'a, N> {
    pub step: N,
    pub agent: &'a str,
    pub route: Route<N>,
    pub duration: Duration,
    pub step_number: usize,
}

/// Passed to the `on_error` hook when an agent errors or a limit is exceeded.
pub struct ErrorEvent<'a> {
    pub agent: &'a str,
    pub error: &'a StepError,
    pub step_number: usize,
}

pub struct Runner<S: State, N: StepId> {
    wf: Workflow<S, N>,
    max_steps: usize,
    on_step: Option<Box<dyn FnMut(&StepEvent<N>)>>,
    on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

impl<S: State, N: StepId> Runner<S, N> {
    pub fn new(wf: Workflow<S, N>) -> Self {
        Self {
            wf,
            max_steps: 10_000,
            on_step: None,
            on_error: None,
        }
    }

    /// Prevent accidental infinite loops.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Register a callback that fires after each successful agent step.
    pub fn on_step(mut self, cb: impl FnMut(&StepEvent<N>) + 'static) -> Self {
        self.on_step = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when an agent errors or a limit is exceeded.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to emit `tracing` events for step transitions and errors.
    pub fn with_tracing(self) -> Self {
        let workflow = self.wf.name();
        self.on_step(move |e| {
            tracing::info!(
                workflow,
                step_number = e.step_number,
                step = e.agent,
                next = %e.route,
                elapsed_ms = e.duration.as_millis() as u64,
                "step finished"
            );
        })
        .on_error(move |e| {
            tracing::error!(
                workflow,
                step_number = e.step_number,
                step = e.agent,
                error = %e.error,
                "workflow aborted"
            );
        })
    }

    pub fn workflow(&self) -> &Workflow<S, N> {
        &self.wf
    }

    /// Run the workflow from its start step until a router returns
    /// [`Route::End`], and return the final state.
    pub fn run(&mut self, mut state: S, ctx: &mut Ctx) -> Result<S, StepError> {
        let mut current = self.wf.start();
        let mut agent_name: &'static str = "";
        let mut step_number: usize = 0;

        for _ in 0..self.max_steps {
            step_number += 1;

            let agent = self
                .wf
                .agent_mut(current)
                .ok_or_else(|| StepError::other(format!("unknown step: {current}")))?;
            agent_name = agent.name();

            let start = Instant::now();
            let result = agent.run(&state, ctx);
            let duration = start.elapsed();

            let update = match result {
                Ok(update) => update,
                Err(err) => {
                    self.report_error(agent_name, &err, step_number);
                    return Err(err);
                }
            };

            state = state.apply(update);

            let route = match self.wf.next(current, &state) {
                Ok(route) => route,
                Err(err) => {
                    self.report_error(agent_name, &err, step_number);
                    return Err(err);
                }
            };

            if let Some(cb) = &mut self.on_step {
                cb(&StepEvent {
                    step: current,
                    agent: agent_name,
                    route,
                    duration,
                    step_number,
                });
            }

            match route {
                Route::End => return Ok(state),
                Route::To(next) => current = next,
            }
        }

        let err = StepError::failed(format!(
            "max_steps exceeded (possible infinite loop) in workflow {}",
            self.wf.name()
        ));
        self.report_error(agent_name, &err, step_number);
        Err(err)
    }

    fn report_error(&mut self, agent: &str, error: &StepError, step_number: usize) {
        if let Some(cb) = &mut self.on_error {
            cb(&ErrorEvent {
                agent,
                error,
                step_number,
            });
        }
    }
}
