//! 协调器：任务视图的唯一修改入口
//!
//! 轮询快照和事件流增量都通过 [`apply`] 合并到同一个 [`TaskView`]。
//! 这里没有 I/O，也没有锁；调用方保证同一时刻只有一个调用者。

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::transitions::StateTransition;
use super::types::{
    IgnoreReason, Outcome, PlanGenerated, ReconcileEvent, StepStatusChange, TaskEnd,
    TaskStateHint,
};
use crate::error::PlanError;
use crate::graph::StepGraph;
use crate::logs::LogBuffer;
use crate::model::{
    LogEntry, Plan, Step, StepFields, StepId, TaskResult, TaskSnapshot, TaskStatus,
};

/// 事件计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub changed: u64,
    pub unchanged: u64,
    pub ignored: u64,
}

/// 一个任务的协调后视图
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    task_id: String,
    status: TaskStatus,
    prompt: String,
    plan_summary: Option<String>,
    plan_version: Option<String>,
    result: Option<TaskResult>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    graph: StepGraph,
    logs: LogBuffer,
    plan_error: Option<PlanError>,
    stats: ReconcileStats,
    /// 首个终态之后任务状态不再变化
    latched: bool,
    snapshot_seen: bool,
    /// 每个步骤最后一次被接受的增量事件时间
    last_incremental: HashMap<StepId, DateTime<Utc>>,
    /// 事件流最近一次安装规划的时间
    plan_installed_at: Option<DateTime<Utc>>,
}

impl TaskView {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Queued,
            prompt: String::new(),
            plan_summary: None,
            plan_version: None,
            result: None,
            created_at: None,
            updated_at: None,
            graph: StepGraph::new(),
            logs: LogBuffer::new(),
            plan_error: None,
            stats: ReconcileStats::default(),
            latched: false,
            snapshot_seen: false,
            last_incremental: HashMap::new(),
            plan_installed_at: None,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn plan_summary(&self) -> Option<&str> {
        self.plan_summary.as_deref()
    }

    pub fn plan_version(&self) -> Option<&str> {
        self.plan_version.as_deref()
    }

    pub fn result(&self) -> Option<&TaskResult> {
        self.result.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    /// 最近一次被拒绝的规划的原因；之后成功安装规划会清除
    pub fn plan_error(&self) -> Option<&PlanError> {
        self.plan_error.as_ref()
    }

    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    pub fn is_terminal(&self) -> bool {
        self.latched
    }

    /// 是否已经收到过任意一个完整快照
    pub fn has_snapshot(&self) -> bool {
        self.snapshot_seen
    }
}

/// 持有视图的协调器
#[derive(Debug, Clone)]
pub struct Reconciler {
    view: TaskView,
}

impl Reconciler {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self::from_view(TaskView::new(task_id))
    }

    pub fn from_view(view: TaskView) -> Self {
        Self { view }
    }

    pub fn view(&self) -> &TaskView {
        &self.view
    }

    pub fn into_view(self) -> TaskView {
        self.view
    }

    pub fn apply(&mut self, event: ReconcileEvent) -> Outcome {
        apply(&mut self.view, event)
    }
}

/// 纯函数形式：`reduce(view, event) -> view`
pub fn reduce(mut view: TaskView, event: ReconcileEvent) -> TaskView {
    apply(&mut view, event);
    view
}

/// 将一个事件合并进视图
pub fn apply(view: &mut TaskView, event: ReconcileEvent) -> Outcome {
    let kind = event.kind();
    let outcome = match event {
        ReconcileEvent::Snapshot(snapshot) => apply_snapshot(view, *snapshot),
        ReconcileEvent::StepStatus(change) => apply_step_status(view, change),
        ReconcileEvent::Log(entry) => apply_log(view, entry),
        ReconcileEvent::PlanGenerated(generated) => apply_plan_generated(view, generated),
        ReconcileEvent::TaskState(hint) => apply_task_state(view, hint),
        ReconcileEvent::TaskEnd(end) => apply_task_end(view, end),
    };

    match outcome {
        Outcome::Changed => view.stats.changed += 1,
        Outcome::Unchanged => view.stats.unchanged += 1,
        Outcome::Ignored(reason) => {
            view.stats.ignored += 1;
            tracing::debug!(
                target: "taskwatch.reconcile",
                stage = "reconcile.ignored",
                task_id = %view.task_id,
                kind,
                reason = reason.as_str()
            );
        }
    }
    outcome
}

fn changed_if(changed: bool) -> Outcome {
    if changed {
        Outcome::Changed
    } else {
        Outcome::Unchanged
    }
}

fn apply_snapshot(view: &mut TaskView, snapshot: TaskSnapshot) -> Outcome {
    if snapshot.id != view.task_id {
        return Outcome::Ignored(IgnoreReason::OtherTask);
    }
    let mut changed = !view.snapshot_seen;
    view.snapshot_seen = true;
    let updated_at = snapshot.updated_at;

    if let Some(steps) = snapshot.plan_steps() {
        if !view.graph.matches_plan(steps) {
            // 事件流安装的规划比这个快照新时保留
            let stream_plan_newer = match (view.plan_installed_at, updated_at) {
                (Some(installed), Some(updated)) => installed >= updated,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if stream_plan_newer {
                tracing::debug!(
                    target: "taskwatch.reconcile",
                    stage = "reconcile.snapshot.stale_plan",
                    task_id = %view.task_id
                );
            } else {
                changed |= install_plan(view, steps.to_vec(), None);
            }
        }
        for step in steps {
            changed |= merge_snapshot_step(view, step, updated_at);
        }
    }
    if let Some(plan) = &snapshot.plan {
        changed |= adopt_plan_metadata(view, plan);
    }

    changed |= merge_task_status(view, snapshot.status);

    if !snapshot.prompt.is_empty() && snapshot.prompt != view.prompt {
        view.prompt = snapshot.prompt;
        changed = true;
    }
    if snapshot.created_at.is_some() && snapshot.created_at != view.created_at {
        view.created_at = snapshot.created_at;
        changed = true;
    }
    if let Some(updated) = updated_at {
        if view.updated_at.map_or(true, |cur| updated > cur) {
            view.updated_at = Some(updated);
            changed = true;
        }
    }
    if let Some(result) = snapshot.result {
        if view.result.as_ref() != Some(&result) {
            view.result = Some(result);
            changed = true;
        }
    }
    if view.logs.extend(snapshot.logs) > 0 {
        changed = true;
    }

    changed_if(changed)
}

fn merge_snapshot_step(
    view: &mut TaskView,
    step: &Step,
    updated_at: Option<DateTime<Utc>>,
) -> bool {
    let Some(current) = view.graph.get(step.step_id) else {
        return false;
    };
    let last = view.last_incremental.get(&step.step_id).copied();
    if !StateTransition::snapshot_wins(current.status, step.status, last, updated_at) {
        tracing::debug!(
            target: "taskwatch.reconcile",
            stage = "reconcile.snapshot.keep_step",
            step_id = step.step_id,
            current = %current.status,
            snapshot = %step.status
        );
        return false;
    }
    let before = current.clone();
    view.graph
        .apply_status_change(step.step_id, step.status, &StepFields::from(step));
    view.graph.get(step.step_id) != Some(&before)
}

fn merge_task_status(view: &mut TaskView, incoming: TaskStatus) -> bool {
    let changed = match StateTransition::task_status(view.latched, view.status, incoming) {
        Some(next) => {
            view.status = next;
            true
        }
        None => false,
    };
    if view.status.is_terminal() && !view.latched {
        view.latched = true;
        tracing::info!(
            target: "taskwatch.reconcile",
            stage = "reconcile.latched",
            task_id = %view.task_id,
            status = %view.status
        );
    }
    changed
}

fn adopt_plan_metadata(view: &mut TaskView, plan: &Plan) -> bool {
    let mut changed = false;
    if plan.summary.is_some() && plan.summary != view.plan_summary {
        view.plan_summary = plan.summary.clone();
        changed = true;
    }
    if plan.version.is_some() && plan.version != view.plan_version {
        view.plan_version = plan.version.clone();
        changed = true;
    }
    changed
}

/// 安装新规划；失败时保留旧规划并记录错误。返回视图是否变化。
fn install_plan(
    view: &mut TaskView,
    steps: Vec<Step>,
    installed_at: Option<DateTime<Utc>>,
) -> bool {
    match view.graph.replace_plan(steps) {
        Ok(change) => {
            for id in &change.dropped {
                view.last_incremental.remove(id);
            }
            if let Some(at) = installed_at {
                view.plan_installed_at = Some(view.plan_installed_at.map_or(at, |cur| cur.max(at)));
            }
            view.plan_error = None;
            true
        }
        Err(err) => {
            tracing::warn!(
                target: "taskwatch.reconcile",
                stage = "reconcile.plan.invalid",
                task_id = %view.task_id,
                error = %err
            );
            let changed = view.plan_error.as_ref() != Some(&err);
            view.plan_error = Some(err);
            changed
        }
    }
}

fn apply_step_status(view: &mut TaskView, change: StepStatusChange) -> Outcome {
    let Some(current) = view.graph.get(change.step_id) else {
        return Outcome::Ignored(IgnoreReason::UnknownStep);
    };
    if let Err(err) = StateTransition::validate(current.status, change.status) {
        tracing::debug!(
            target: "taskwatch.reconcile",
            stage = "reconcile.step.rejected",
            step_id = change.step_id,
            error = %err
        );
        return Outcome::Ignored(IgnoreReason::StaleStatus);
    }
    let before = current.clone();
    view.graph
        .apply_status_change(change.step_id, change.status, &change.fields);

    let seen = view
        .last_incremental
        .entry(change.step_id)
        .or_insert(change.timestamp);
    if change.timestamp > *seen {
        *seen = change.timestamp;
    }

    changed_if(view.graph.get(change.step_id) != Some(&before))
}

fn apply_log(view: &mut TaskView, entry: LogEntry) -> Outcome {
    changed_if(view.logs.append(entry))
}

fn apply_plan_generated(view: &mut TaskView, generated: PlanGenerated) -> Outcome {
    let PlanGenerated { plan, timestamp } = generated;
    let had_error = view.plan_error.is_some();
    let changed = install_plan(view, plan.steps.clone(), Some(timestamp));
    if view.plan_error.is_some() {
        return if changed {
            Outcome::Changed
        } else {
            Outcome::Ignored(IgnoreReason::InvalidPlan)
        };
    }
    tracing::debug!(
        target: "taskwatch.reconcile",
        stage = "reconcile.plan.installed",
        task_id = %view.task_id,
        steps = view.graph.len(),
        cleared_error = had_error
    );
    adopt_plan_metadata(view, &plan);
    Outcome::Changed
}

fn apply_task_state(view: &mut TaskView, hint: TaskStateHint) -> Outcome {
    if hint.task_id.as_deref().is_some_and(|id| id != view.task_id) {
        return Outcome::Ignored(IgnoreReason::OtherTask);
    }
    let mut changed = false;
    if let Some(plan) = hint.plan.filter(|p| !p.steps.is_empty()) {
        if view.graph.is_empty() {
            changed |= install_plan(view, plan.steps.clone(), None);
        } else {
            for step in &plan.steps {
                changed |= merge_snapshot_step(view, step, None);
            }
        }
        changed |= adopt_plan_metadata(view, &plan);
    }
    // 没有时间戳，只允许前进
    if StateTransition::validate(view.status, hint.status).is_ok() {
        changed |= merge_task_status(view, hint.status);
    }
    changed_if(changed)
}

fn apply_task_end(view: &mut TaskView, end: TaskEnd) -> Outcome {
    let TaskEnd {
        status,
        result,
        error,
        ..
    } = end;
    let result = match (result, error) {
        (Some(mut result), Some(error)) => {
            result.error.get_or_insert(error);
            Some(result)
        }
        (Some(result), None) => Some(result),
        (None, Some(error)) => Some(TaskResult {
            error: Some(error),
            ..TaskResult::default()
        }),
        (None, None) => None,
    };

    if view.latched {
        if view.result.is_none() && result.is_some() {
            view.result = result;
            return Outcome::Changed;
        }
        tracing::info!(
            target: "taskwatch.reconcile",
            stage = "reconcile.task_end.duplicate",
            task_id = %view.task_id,
            latched = %view.status,
            incoming = %status
        );
        return Outcome::Ignored(IgnoreReason::TerminalLatched);
    }

    let mut changed = merge_task_status(view, status);
    if result.is_some() && result != view.result {
        view.result = result;
        changed = true;
    }
    changed_if(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogLevel, StepStatus};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const TASK: &str = "task-1";

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, secs).unwrap()
    }

    fn chain(statuses: &[StepStatus]) -> Vec<Step> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, &status)| {
                let id = i as StepId + 1;
                let deps = if id == 1 { vec![] } else { vec![id - 1] };
                let mut step = Step::new(id, format!("step {id}"), deps);
                step.status = status;
                step
            })
            .collect()
    }

    fn snapshot(
        status: TaskStatus,
        steps: Vec<Step>,
        updated: Option<DateTime<Utc>>,
    ) -> ReconcileEvent {
        let mut snap = TaskSnapshot::new(TASK, status);
        snap.plan = Some(Plan::from_steps(steps));
        snap.updated_at = updated;
        ReconcileEvent::Snapshot(Box::new(snap))
    }

    fn step_event(step_id: StepId, status: StepStatus, ts: DateTime<Utc>) -> ReconcileEvent {
        ReconcileEvent::StepStatus(StepStatusChange {
            step_id,
            status,
            timestamp: ts,
            fields: StepFields::default(),
        })
    }

    fn plan_event(steps: Vec<Step>, ts: DateTime<Utc>) -> ReconcileEvent {
        ReconcileEvent::PlanGenerated(PlanGenerated {
            plan: Plan::from_steps(steps),
            timestamp: ts,
        })
    }

    fn end_event(status: TaskStatus, error: Option<&str>, ts: DateTime<Utc>) -> ReconcileEvent {
        ReconcileEvent::TaskEnd(TaskEnd {
            status,
            result: None,
            error: error.map(str::to_string),
            timestamp: ts,
        })
    }

    fn log_event(id: &str, secs: u32) -> ReconcileEvent {
        ReconcileEvent::Log(LogEntry::new(LogLevel::Info, format!("line {id}"), at(secs)).with_id(id))
    }

    fn statuses(view: &TaskView) -> Vec<StepStatus> {
        view.graph().steps().iter().map(|s| s.status).collect()
    }

    #[test]
    fn test_step_status_never_regresses() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(plan_event(chain(&[Queued]), at(0)));

        assert_eq!(rec.apply(step_event(1, Running, at(1))), Outcome::Changed);
        assert_eq!(
            rec.apply(step_event(1, Queued, at(2))),
            Outcome::Ignored(IgnoreReason::StaleStatus)
        );
        assert_eq!(rec.apply(step_event(1, Completed, at(3))), Outcome::Changed);
        assert_eq!(
            rec.apply(step_event(1, Failed, at(4))),
            Outcome::Ignored(IgnoreReason::StaleStatus)
        );
        assert_eq!(statuses(rec.view()), vec![Completed]);
    }

    #[test]
    fn test_stale_snapshot_does_not_undo_stream_progress() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(plan_event(chain(&[Queued, Queued, Queued]), at(0)));
        rec.apply(step_event(1, Running, at(1)));
        rec.apply(step_event(1, Completed, at(2)));
        rec.apply(step_event(2, Running, at(3)));

        rec.apply(snapshot(
            TaskStatus::Running,
            chain(&[Running, Queued, Queued]),
            Some(at(1)),
        ));

        assert_eq!(statuses(rec.view()), vec![Completed, Running, Queued]);
        assert_eq!(rec.view().status(), TaskStatus::Running);
    }

    #[test]
    fn test_newer_snapshot_overrides_incremental_state() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(plan_event(chain(&[Queued]), at(0)));
        rec.apply(step_event(1, Running, at(1)));

        // retried on the backend: back to QUEUED after the stream said RUNNING
        rec.apply(snapshot(TaskStatus::Running, chain(&[Queued]), Some(at(5))));
        assert_eq!(statuses(rec.view()), vec![Queued]);
    }

    #[test]
    fn test_snapshot_without_incremental_history_is_adopted() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(snapshot(TaskStatus::Running, chain(&[Running, Queued]), None));
        rec.apply(snapshot(TaskStatus::Running, chain(&[Queued, Queued]), None));
        assert_eq!(statuses(rec.view()), vec![Queued, Queued]);
    }

    #[test]
    fn test_task_end_failed_is_latched() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(snapshot(TaskStatus::Running, chain(&[Running]), Some(at(1))));
        assert_eq!(
            rec.apply(end_event(TaskStatus::Failed, Some("agent crashed"), at(2))),
            Outcome::Changed
        );

        rec.apply(snapshot(TaskStatus::Running, chain(&[Running]), Some(at(3))));
        assert_eq!(rec.view().status(), TaskStatus::Failed);
        assert!(rec.view().is_terminal());
        assert_eq!(
            rec.view().result().and_then(|r| r.error.as_deref()),
            Some("agent crashed")
        );

        assert_eq!(
            rec.apply(end_event(TaskStatus::Completed, None, at(4))),
            Outcome::Ignored(IgnoreReason::TerminalLatched)
        );
        assert_eq!(rec.view().status(), TaskStatus::Failed);
    }

    #[test]
    fn test_terminal_snapshot_latches_status() {
        let mut rec = Reconciler::new(TASK);
        rec.apply(snapshot(TaskStatus::Completed, vec![], None));
        rec.apply(ReconcileEvent::TaskState(TaskStateHint {
            task_id: None,
            status: TaskStatus::Running,
            plan: None,
        }));
        assert_eq!(rec.view().status(), TaskStatus::Completed);
    }

    #[test]
    fn test_cyclic_plan_keeps_previous_plan() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(plan_event(chain(&[Queued, Queued]), at(0)));
        rec.apply(step_event(1, Running, at(1)));

        let mut cyclic = chain(&[Queued, Queued]);
        cyclic[0].dependencies = vec![2];
        assert_eq!(rec.apply(plan_event(cyclic.clone(), at(2))), Outcome::Changed);
        assert!(matches!(
            rec.view().plan_error(),
            Some(PlanError::CircularDependency(_))
        ));
        assert_eq!(statuses(rec.view()), vec![Running, Queued]);

        assert_eq!(
            rec.apply(plan_event(cyclic, at(3))),
            Outcome::Ignored(IgnoreReason::InvalidPlan)
        );

        rec.apply(plan_event(chain(&[Queued, Queued, Queued]), at(4)));
        assert_eq!(rec.view().plan_error(), None);
        assert_eq!(statuses(rec.view()), vec![Running, Queued, Queued]);
    }

    #[test]
    fn test_regenerated_plan_drops_late_events_for_removed_steps() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(plan_event(chain(&[Queued, Queued, Queued]), at(0)));
        rec.apply(plan_event(chain(&[Queued]), at(1)));
        assert_eq!(
            rec.apply(step_event(3, Running, at(2))),
            Outcome::Ignored(IgnoreReason::UnknownStep)
        );
        assert_eq!(rec.view().graph().len(), 1);
    }

    #[test]
    fn test_snapshot_plan_older_than_stream_plan_is_ignored() {
        use TaskStatus::*;
        let mut rec = Reconciler::new(TASK);
        rec.apply(plan_event(chain(&[Queued, Queued]), at(5)));
        rec.apply(snapshot(TaskStatus::Running, chain(&[Queued]), Some(at(4))));
        assert_eq!(rec.view().graph().len(), 2);

        rec.apply(snapshot(TaskStatus::Running, chain(&[Queued]), Some(at(6))));
        assert_eq!(rec.view().graph().len(), 1);
    }

    #[test]
    fn test_logs_from_both_sources_are_not_duplicated() {
        let mut rec = Reconciler::new(TASK);
        let line = LogEntry::new(LogLevel::Info, "step 1 started", at(1)).with_step(1);

        let mut snap = TaskSnapshot::new(TASK, TaskStatus::Running);
        snap.logs = vec![line.clone()];
        rec.apply(ReconcileEvent::Snapshot(Box::new(snap)));
        assert_eq!(
            rec.apply(ReconcileEvent::Log(line.clone())),
            Outcome::Unchanged
        );
        assert_eq!(rec.view().logs().len(), 1);
    }

    #[test]
    fn test_events_for_other_task_are_ignored() {
        let mut rec = Reconciler::new(TASK);
        let other = TaskSnapshot::new("task-2", TaskStatus::Failed);
        assert_eq!(
            rec.apply(ReconcileEvent::Snapshot(Box::new(other))),
            Outcome::Ignored(IgnoreReason::OtherTask)
        );
        assert_eq!(rec.view().status(), TaskStatus::Queued);
        assert_eq!(rec.view().stats().ignored, 1);
    }

    #[test]
    fn test_task_state_hint_installs_plan_only_when_empty() {
        use TaskStatus::*;
        let hint = |steps: Vec<Step>, status| {
            ReconcileEvent::TaskState(TaskStateHint {
                task_id: Some(TASK.to_string()),
                status,
                plan: Some(Plan::from_steps(steps)),
            })
        };
        let mut rec = Reconciler::new(TASK);
        rec.apply(hint(chain(&[Running, Queued]), TaskStatus::Running));
        assert_eq!(statuses(rec.view()), vec![Running, Queued]);

        rec.apply(step_event(2, Running, at(1)));
        rec.apply(hint(chain(&[Completed]), TaskStatus::Queued));
        assert_eq!(rec.view().graph().len(), 2);
        assert_eq!(statuses(rec.view()), vec![Completed, Running]);
        assert_eq!(rec.view().status(), TaskStatus::Running);
    }

    #[test]
    fn test_reduce_matches_apply() {
        let events = vec![
            plan_event(chain(&[StepStatus::Queued]), at(0)),
            step_event(1, StepStatus::Running, at(1)),
            log_event("a", 1),
        ];
        let mut rec = Reconciler::new(TASK);
        let mut view = TaskView::new(TASK);
        for event in events {
            rec.apply(event.clone());
            view = reduce(view, event);
        }
        assert_eq!(&view, rec.view());
    }

    fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head.clone());
                out.push(tail);
            }
        }
        out
    }

    /// Everything a user can see, minus bookkeeping that depends on arrival
    /// order (counters, incremental timestamps).
    fn visible(view: &TaskView) -> (TaskStatus, Vec<Step>, Vec<LogEntry>, Option<TaskResult>) {
        (
            view.status(),
            view.graph().steps().to_vec(),
            view.logs().entries().to_vec(),
            view.result().cloned(),
        )
    }

    #[test]
    fn test_any_interleaving_converges_after_final_snapshot() {
        use TaskStatus::*;
        let stream_and_stale_poll = vec![
            plan_event(chain(&[Queued, Queued, Queued]), at(0)),
            step_event(1, Running, at(1)),
            step_event(1, Completed, at(2)),
            step_event(2, Running, at(3)),
            log_event("a", 1),
            log_event("b", 3),
            snapshot(TaskStatus::Running, chain(&[Running, Queued, Queued]), Some(at(1))),
        ];
        let mut final_snap = TaskSnapshot::new(TASK, TaskStatus::Completed);
        final_snap.plan = Some(Plan::from_steps(chain(&[Completed, Completed, Completed])));
        final_snap.updated_at = Some(at(9));
        final_snap.logs = vec![LogEntry::new(LogLevel::Info, "line a", at(1)).with_id("a")];
        let final_snap = ReconcileEvent::Snapshot(Box::new(final_snap));
        let end = end_event(TaskStatus::Completed, None, at(8));

        let mut expected = None;
        for mut order in permutations(&stream_and_stale_poll) {
            order.push(end.clone());
            order.push(final_snap.clone());
            let mut rec = Reconciler::new(TASK);
            for event in order {
                rec.apply(event);
            }
            let seen = visible(rec.view());
            match &expected {
                None => expected = Some(seen),
                Some(first) => assert_eq!(first, &seen),
            }
        }
        let (status, steps, logs, _) = expected.unwrap();
        assert_eq!(status, TaskStatus::Completed);
        assert!(steps.iter().all(|s| s.status == Completed));
        assert_eq!(logs.len(), 2);
    }

    #[test]
    fn test_terminal_status_is_order_independent() {
        let events = vec![
            snapshot(TaskStatus::Running, chain(&[StepStatus::Running]), Some(at(1))),
            end_event(TaskStatus::Failed, Some("boom"), at(2)),
            ReconcileEvent::TaskState(TaskStateHint {
                task_id: None,
                status: TaskStatus::Running,
                plan: None,
            }),
        ];
        for order in permutations(&events) {
            let view = order.into_iter().fold(TaskView::new(TASK), reduce);
            assert_eq!(view.status(), TaskStatus::Failed);
        }
    }
}
