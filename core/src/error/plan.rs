use thiserror::Error;

use crate::model::StepId;

/// Plan validation failures. The step graph refuses to install a plan that
/// produces any of these and keeps the previous one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Duplicate step ID: {0}")]
    DuplicateStepId(StepId),

    #[error("Dependency not found: step {step_id} depends on {missing_dep}")]
    DependencyNotFound { step_id: StepId, missing_dep: StepId },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}
