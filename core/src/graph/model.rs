use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::dag::{stages, validate_plan};
use crate::error::PlanError;
use crate::model::{Step, StepFields, StepId, StepStatus};

/// The installed step set of one task, in plan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepGraph {
    steps: Vec<Step>,
    index: HashMap<StepId, usize>,
}

/// What a successful `replace_plan` did to the previous step set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanChange {
    pub carried: Vec<StepId>,
    pub added: Vec<StepId>,
    pub dropped: Vec<StepId>,
}

impl PlanChange {
    /// True when the new plan has exactly the old step ids.
    pub fn is_same_shape(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUpdate {
    Applied { from: StepStatus, to: StepStatus },
    UnknownStep,
}

/// Directed edge `source → target`: `target` depends on `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: StepId,
    pub target: StepId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.queued + self.running + self.completed + self.failed
    }

    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }
}

impl StepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, step_id: StepId) -> Option<&Step> {
        self.index.get(&step_id).map(|&i| &self.steps[i])
    }

    pub fn contains(&self, step_id: StepId) -> bool {
        self.index.contains_key(&step_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether `steps` describes the installed plan: same ids in the same
    /// order, same names and the same dependency sets. Execution state is
    /// not compared.
    pub fn matches_plan(&self, steps: &[Step]) -> bool {
        steps.len() == self.steps.len()
            && steps.iter().zip(&self.steps).all(|(new, cur)| {
                new.step_id == cur.step_id
                    && new.name == cur.name
                    && same_deps(&new.dependencies, &cur.dependencies)
            })
    }

    /// Install a new ordered step set.
    ///
    /// Steps whose id existed in the previous plan keep their execution state
    /// (status, timestamps, retry count). Everything else from the previous
    /// plan is discarded. On validation failure nothing changes.
    pub fn replace_plan(&mut self, steps: Vec<Step>) -> Result<PlanChange, PlanError> {
        let mut steps = steps;
        for step in &mut steps {
            let mut seen = HashSet::new();
            step.dependencies.retain(|d| seen.insert(*d));
        }
        validate_plan(&steps)?;

        let mut change = PlanChange::default();
        let new_ids: HashSet<StepId> = steps.iter().map(|s| s.step_id).collect();
        for step in &mut steps {
            match self.get(step.step_id) {
                Some(prev) => {
                    step.carry_forward_from(prev);
                    change.carried.push(step.step_id);
                }
                None => change.added.push(step.step_id),
            }
        }
        change.dropped = self
            .steps
            .iter()
            .map(|s| s.step_id)
            .filter(|id| !new_ids.contains(id))
            .collect();

        self.index = steps
            .iter()
            .enumerate()
            .map(|(i, s)| (s.step_id, i))
            .collect();
        self.steps = steps;

        tracing::debug!(
            target: "taskwatch.graph",
            stage = "graph.replace_plan",
            steps = self.steps.len(),
            carried = change.carried.len(),
            added = change.added.len(),
            dropped = change.dropped.len()
        );
        Ok(change)
    }

    /// Set one step's status and merge the provided fields.
    ///
    /// An unknown id is expected (late event for a superseded plan) and only
    /// logged.
    pub fn apply_status_change(
        &mut self,
        step_id: StepId,
        status: StepStatus,
        fields: &StepFields,
    ) -> StepUpdate {
        let Some(&i) = self.index.get(&step_id) else {
            tracing::debug!(
                target: "taskwatch.graph",
                stage = "graph.status.unknown_step",
                step_id,
                status = %status
            );
            return StepUpdate::UnknownStep;
        };
        let step = &mut self.steps[i];
        let from = step.status;
        step.status = status;
        step.merge_fields(fields);
        StepUpdate::Applied { from, to: status }
    }

    /// One edge per (dependency → step) pair, in step order.
    pub fn to_edges(&self) -> Vec<Edge> {
        self.steps
            .iter()
            .flat_map(|s| {
                s.dependencies.iter().map(move |&dep| Edge {
                    source: dep,
                    target: s.step_id,
                })
            })
            .collect()
    }

    pub fn stages(&self) -> Vec<Vec<StepId>> {
        stages(&self.steps)
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for step in &self.steps {
            match step.status {
                StepStatus::Queued => counts.queued += 1,
                StepStatus::Running => counts.running += 1,
                StepStatus::Completed => counts.completed += 1,
                StepStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

fn same_deps(a: &[StepId], b: &[StepId]) -> bool {
    let a: HashSet<StepId> = a.iter().copied().collect();
    let b: HashSet<StepId> = b.iter().copied().collect();
    a == b
}
