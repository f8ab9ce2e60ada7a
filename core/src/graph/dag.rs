use std::collections::{HashMap, HashSet};

use crate::error::PlanError;
use crate::model::{Step, StepId};

/// Validate dependency relationships of a candidate plan.
pub fn validate_plan(steps: &[Step]) -> Result<(), PlanError> {
    let mut ids = HashSet::with_capacity(steps.len());
    for step in steps {
        if !ids.insert(step.step_id) {
            return Err(PlanError::DuplicateStepId(step.step_id));
        }
    }

    for step in steps {
        for dep in &step.dependencies {
            if !ids.contains(dep) {
                return Err(PlanError::DependencyNotFound {
                    step_id: step.step_id,
                    missing_dep: *dep,
                });
            }
        }
    }

    if let Some(cycle) = detect_cycle(steps) {
        return Err(PlanError::CircularDependency(cycle));
    }

    Ok(())
}

/// Detect circular dependencies using DFS, visiting roots in plan order so the
/// reported path is deterministic. The walk keeps its own stack of
/// `(step, next dependency index)` frames, so plan depth is not bounded by
/// the thread stack.
///
/// # Time Complexity
///
/// O(V + E) where V = number of steps, E = number of dependencies
fn detect_cycle(steps: &[Step]) -> Option<String> {
    let edges: HashMap<StepId, &[StepId]> = steps
        .iter()
        .map(|s| (s.step_id, s.dependencies.as_slice()))
        .collect();

    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    let mut stack: Vec<(StepId, usize)> = Vec::new();

    for step in steps {
        if !visited.insert(step.step_id) {
            continue;
        }
        on_path.insert(step.step_id);
        stack.push((step.step_id, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let deps = edges.get(&node).copied().unwrap_or_default();
            let Some(&dep) = deps.get(frame.1) else {
                on_path.remove(&node);
                stack.pop();
                continue;
            };
            frame.1 += 1;

            if on_path.contains(&dep) {
                // Trim the path to the cycle itself and close it.
                let mut path: Vec<StepId> = stack.iter().map(|(id, _)| *id).collect();
                if let Some(pos) = path.iter().position(|x| *x == dep) {
                    path.drain(..pos);
                }
                path.push(dep);
                return Some(format_cycle_path(&path));
            }
            if visited.insert(dep) {
                on_path.insert(dep);
                stack.push((dep, 0));
            }
        }
    }

    None
}

fn format_cycle_path(path: &[StepId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Topological stages using Kahn's algorithm.
///
/// Steps in the same stage have no dependency on each other. Stage members
/// keep plan order. Assumes `steps` already passed [`validate_plan`]; steps
/// that cannot be scheduled are left out.
pub fn stages(steps: &[Step]) -> Vec<Vec<StepId>> {
    let position: HashMap<StepId, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.step_id, i))
        .collect();

    // edges[A] = [B, C] means A depends on B and C, so A's in-degree is 2
    let mut in_degree: HashMap<StepId, usize> = steps
        .iter()
        .map(|s| (s.step_id, s.dependencies.len()))
        .collect();
    let mut dependents: HashMap<StepId, Vec<StepId>> = HashMap::new();
    for step in steps {
        for dep in &step.dependencies {
            dependents.entry(*dep).or_default().push(step.step_id);
        }
    }

    let mut current: Vec<StepId> = steps
        .iter()
        .filter(|s| s.dependencies.is_empty())
        .map(|s| s.step_id)
        .collect();
    let mut out = Vec::new();

    while !current.is_empty() {
        let mut next = Vec::new();
        for id in &current {
            for dependent in dependents.get(id).map(Vec::as_slice).unwrap_or_default() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(*dependent);
                    }
                }
            }
        }
        next.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
        out.push(std::mem::replace(&mut current, next));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(deps: &[&[StepId]]) -> Vec<Step> {
        deps.iter()
            .enumerate()
            .map(|(i, d)| Step::new(i as StepId + 1, format!("step {}", i + 1), d.to_vec()))
            .collect()
    }

    #[test]
    fn test_valid_chain() {
        assert!(validate_plan(&plan(&[&[], &[1], &[2]])).is_ok());
    }

    #[test]
    fn test_two_step_cycle_reports_path() {
        let err = validate_plan(&plan(&[&[], &[3], &[2]])).unwrap_err();
        assert_eq!(err, PlanError::CircularDependency("2 -> 3 -> 2".to_string()));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let err = validate_plan(&plan(&[&[1]])).unwrap_err();
        assert_eq!(err, PlanError::CircularDependency("1 -> 1".to_string()));
    }

    #[test]
    fn test_missing_dependency() {
        let err = validate_plan(&plan(&[&[], &[9]])).unwrap_err();
        assert_eq!(
            err,
            PlanError::DependencyNotFound {
                step_id: 2,
                missing_dep: 9
            }
        );
    }

    #[test]
    fn test_duplicate_step_id() {
        let mut steps = plan(&[&[], &[]]);
        steps[1].step_id = 1;
        assert_eq!(
            validate_plan(&steps).unwrap_err(),
            PlanError::DuplicateStepId(1)
        );
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        // step k depends on k + 1, so the walk from step 1 spans the whole plan
        let n: StepId = 200_000;
        let mut steps: Vec<Step> = (1..=n)
            .map(|id| {
                let deps = if id == n { vec![] } else { vec![id + 1] };
                Step::new(id, "s", deps)
            })
            .collect();
        assert!(validate_plan(&steps).is_ok());
        assert_eq!(stages(&steps).len(), n as usize);

        steps[n as usize - 1].dependencies.push(n - 2);
        let err = validate_plan(&steps).unwrap_err();
        assert_eq!(
            err,
            PlanError::CircularDependency(format!("{} -> {} -> {} -> {}", n - 2, n - 1, n, n - 2))
        );
    }

    #[test]
    fn test_stages_diamond() {
        // 1 → {2, 3} → 4
        let steps = plan(&[&[], &[1], &[1], &[2, 3]]);
        assert_eq!(stages(&steps), vec![vec![1], vec![2, 3], vec![4]]);
    }
}
