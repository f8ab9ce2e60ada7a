//! Step dependency graph (DAG) for one task plan.
//!
//! ```text
//! Vec<Step>
//!   ↓
//! validate_plan() → duplicate ids, missing deps, detect_cycle()
//!   ↓
//! StepGraph::replace_plan() → carry forward status of surviving step ids
//!   ↓
//! StepGraph::to_edges() / StepGraph::stages()
//! ```

mod dag;
mod model;

pub use dag::{stages, validate_plan};
pub use model::{Edge, PlanChange, StatusCounts, StepGraph, StepUpdate};
