//! Synchronous state-passing step graphs for agent workflows.
//!
//! Agents read the shared state and return a partial update, which the
//! runner merges with [`State::apply`]. After each step a fixed edge or a
//! router picks the next step, or [`Route::End`]. Step ids are plain enums
//! (or any [`StepId`]), and every route a router may take is declared up
//! front so the wiring is checked when the workflow is built.
//!
//! Two workflows ship with the crate: [`plan_review`], a planner/reviewer
//! loop gated on approval, and [`realty`], a research, valuation and report
//! pipeline over a chat model and a web search tool.
//!
//! # Quick start
//!
//! ```rust
//! use stepgraph::{Agent, Ctx, Route, Runner, State, StepResult, Workflow};
//!
//! #[derive(Clone)]
//! struct Counter { n: u32 }
//!
//! impl State for Counter {
//!     type Update = u32;
//!     fn apply(self, update: u32) -> Self {
//!         Counter { n: self.n + update }
//!     }
//! }
//!
//! struct AddOne;
//! impl Agent<Counter> for AddOne {
//!     fn name(&self) -> &'static str { "add_one" }
//!     fn run(&mut self, _state: &Counter, _ctx: &mut Ctx) -> StepResult<Counter> {
//!         Ok(1)
//!     }
//! }
//!
//! let wf = Workflow::builder("demo")
//!     .register("add_one", AddOne)
//!     .route(
//!         "add_one",
//!         |s: &Counter| if s.n < 3 { Route::To("add_one") } else { Route::End },
//!         [Route::To("add_one"), Route::End],
//!     )
//!     .build()
//!     .unwrap();
//!
//! let result = Runner::new(wf).run(Counter { n: 0 }, &mut Ctx::new()).unwrap();
//! assert_eq!(result.n, 3);
//! ```

mod agent;
mod ctx;
mod runner;
mod workflow;

pub mod config;
pub mod llm;
pub mod plan_review;
pub mod realty;
pub mod tools;

#[cfg(test)]
mod testing;

pub use agent::{Agent, State, StepError, StepLog, StepResult};
pub use ctx::Ctx;
pub use runner::{ErrorEvent, Runner, StepEvent};
pub use workflow::{Route, StepId, Workflow, WorkflowBuilder, WorkflowError};
