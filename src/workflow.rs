use crate::{Agent, State, StepError};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Step ids and routes
// ---------------------------------------------------------------------------

/// Identifier of a step in a workflow. Usually a small fieldless enum, so the
/// wiring of a workflow is checked for exhaustiveness by the compiler.
pub trait StepId: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + 'static {}

impl<T> StepId for T where T: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + 'static {}

/// Where the runner goes after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route<N> {
    /// Run this step next.
    To(N),
    /// The terminal sink: return the final state.
    End,
}

impl<N: fmt::Display> fmt::Display for Route<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To(step) => write!(f, "{step}"),
            Self::End => write!(f, "END"),
        }
    }
}

type RouterFn<S, N> = Box<dyn Fn(&S) -> Route<N> + Send>;

enum Edge<S, N> {
    Fixed(N),
    Routed {
        router: RouterFn<S, N>,
        targets: Vec<Route<N>>,
    },
}

// ---------------------------------------------------------------------------
// WorkflowError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("duplicate agent: {0}")]
    DuplicateAgent(String),
    #[error("unknown step: {0}")]
    UnknownStep(String),
    #[error("workflow missing start step")]
    MissingStart,
    #[error("step {0} has no outgoing edge")]
    MissingEdge(String),
}

// ---------------------------------------------------------------------------
// WorkflowBuilder
// ---------------------------------------------------------------------------

pub struct WorkflowBuilder<S: State, N: StepId> {
    name: &'static str,
    start: Option<N>,
    chain_last: Option<N>,
    agents: HashMap<N, Box<dyn Agent<S>>>,
    edges: HashMap<N, Edge<S, N>>,
    duplicate: Option<N>,
}

impl<S: State, N: StepId> WorkflowBuilder<S, N> {
    pub fn register<A: Agent<S>>(mut self, id: N, agent: A) -> Self {
        if self.agents.contains_key(&id) {
            self.duplicate = Some(id);
        }
        self.agents.insert(id, Box::new(agent));

        // If this is the first agent added and start isn't set, default start to it.
        if self.start.is_none() {
            self.start = Some(id);
        }

        if self.chain_last.is_none() {
            self.chain_last = Some(id);
        }

        self
    }

    pub fn start_at(mut self, step: N) -> Self {
        self.start = Some(step);
        self.chain_last = Some(step);
        self
    }

    /// Chain the next step: current(chain_last) -> next
    pub fn then(mut self, next: N) -> Self {
        let Some(current) = self.chain_last else {
            // No prior step; treat `next` as the start
            self.start = Some(next);
            self.chain_last = Some(next);
            return self;
        };

        self.edges.insert(current, Edge::Fixed(next));
        self.chain_last = Some(next);
        self
    }

    /// Add a fixed edge `from -> to` without touching the chain.
    pub fn edge(mut self, from: N, to: N) -> Self {
        self.edges.insert(from, Edge::Fixed(to));
        self
    }

    /// After `from`, evaluate `router` against the merged state. The router
    /// may only select one of `targets`.
    pub fn route<R>(mut self, from: N, router: R, targets: impl IntoIterator<Item = Route<N>>) -> Self
    where
        R: Fn(&S) -> Route<N> + Send + 'static,
    {
        self.edges.insert(
            from,
            Edge::Routed {
                router: Box::new(router),
                targets: targets.into_iter().collect(),
            },
        );
        self
    }

    pub fn build(self) -> Result<Workflow<S, N>, WorkflowError> {
        if let Some(id) = self.duplicate {
            return Err(WorkflowError::DuplicateAgent(id.to_string()));
        }

        let start = self.start.ok_or(WorkflowError::MissingStart)?;

        if !self.agents.contains_key(&start) {
            return Err(WorkflowError::UnknownStep(start.to_string()));
        }

        for (from, edge) in &self.edges {
            if !self.agents.contains_key(from) {
                return Err(WorkflowError::UnknownStep(from.to_string()));
            }
            let unknown = match edge {
                Edge::Fixed(to) => (!self.agents.contains_key(to)).then_some(*to),
                Edge::Routed { targets, .. } => targets.iter().find_map(|target| match target {
                    Route::To(to) if !self.agents.contains_key(to) => Some(*to),
                    _ => None,
                }),
            };
            if let Some(to) = unknown {
                return Err(WorkflowError::UnknownStep(to.to_string()));
            }
        }

        if let Some(id) = self.agents.keys().find(|id| !self.edges.contains_key(*id)) {
            return Err(WorkflowError::MissingEdge(id.to_string()));
        }

        Ok(Workflow {
            name: self.name,
            start,
            agents: self.agents,
            edges: self.edges,
        })
    }
}

// ---------------------------------------------------------------------------
// Workflow (validated, only constructed via build())
// ---------------------------------------------------------------------------

pub struct Workflow<S: State, N: StepId> {
    name: &'static str,
    start: N,
    agents: HashMap<N, Box<dyn Agent<S>>>,
    edges: HashMap<N, Edge<S, N>>,
}

impl<S: State, N: StepId> Workflow<S, N> {
    pub fn builder(name: &'static str) -> WorkflowBuilder<S, N> {
        WorkflowBuilder {
            name,
            start: None,
            chain_last: None,
            agents: HashMap::new(),
            edges: HashMap::new(),
            duplicate: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Every route a step may take next, in declaration order.
    pub fn targets(&self, from: N) -> Vec<Route<N>> {
        match self.edges.get(&from) {
            Some(Edge::Fixed(to)) => vec![Route::To(*to)],
            Some(Edge::Routed { targets, .. }) => targets.clone(),
            None => Vec::new(),
        }
    }

    // --- stuff the runner uses (keep pub(crate)) ---
    pub(crate) fn start(&self) -> N {
        self.start
    }

    pub(crate) fn agent_mut(&mut self, id: N) -> Option<&mut Box<dyn Agent<S>>> {
        self.agents.get_mut(&id)
    }

    pub(crate) fn next(&self, from: N, state: &S) -> Result<Route<N>, StepError> {
        match self.edges.get(&from) {
            Some(Edge::Fixed(to)) => Ok(Route::To(*to)),
            Some(Edge::Routed { router, targets }) => {
                let route = router(state);
                if targets.contains(&route) {
                    Ok(route)
                } else {
                    Err(StepError::invalid(format!(
                        "router after '{from}' selected undeclared target '{route}'"
                    )))
                }
            }
            None => Err(StepError::other(format!(
                "step '{from}' has no outgoing edge"
            ))),
        }
    }
}
