use serde::Serialize;

use super::style::{connection_tone, status_icon, status_tone, Tone};
use crate::graph::StatusCounts;
use crate::model::TaskStatus;
use crate::session::SourceHealth;
use crate::state::TaskView;
use crate::stream::{ConnectionPhase, ConnectionState};

/// What to show in place of, or above, the step graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum PlanNotice {
    Summary(String),
    /// The planner ran and decided the task needs no steps.
    NoPlanningRequired,
    /// No plan has been seen yet.
    Pending,
    /// The last plan was rejected; the previous one is still shown.
    Invalid(String),
}

impl PlanNotice {
    pub fn text(&self) -> String {
        match self {
            Self::Summary(s) => s.clone(),
            Self::NoPlanningRequired => "No planning required for this task.".to_string(),
            Self::Pending => "Waiting for plan...".to_string(),
            Self::Invalid(reason) => format!("Plan rejected: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionIndicator {
    pub phase: ConnectionPhase,
    pub label: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub task_id: String,
    pub status: TaskStatus,
    pub status_label: &'static str,
    pub tone: Tone,
    pub icon: &'static str,
    pub prompt: String,
    pub counts: StatusCounts,
    /// Finished steps over all steps, 0.0 without a plan.
    pub progress: f64,
    pub connection: ConnectionIndicator,
    /// Set while poll requests are failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_notice: Option<PlanNotice>,
}

pub fn header(view: &TaskView, connection: &ConnectionState, health: &SourceHealth) -> Header {
    let counts = view.graph().counts();
    let progress = if counts.total() == 0 {
        0.0
    } else {
        counts.finished() as f64 / counts.total() as f64
    };

    let label = match (connection.phase, connection.attempt) {
        (ConnectionPhase::Reconnecting, n) if n > 0 => format!("reconnecting (attempt {n})"),
        (phase, _) => phase.as_str().to_lowercase(),
    };
    let poll_warning = (health.poll_failures > 0).then(|| {
        format!(
            "poll failing ({}x): {}",
            health.poll_failures,
            health.last_poll_error.as_deref().unwrap_or("unknown error")
        )
    });

    Header {
        task_id: view.task_id().to_string(),
        status: view.status(),
        status_label: view.status().as_str(),
        tone: status_tone(view.status()),
        icon: status_icon(view.status()),
        prompt: view.prompt().to_string(),
        counts,
        progress,
        connection: ConnectionIndicator {
            phase: connection.phase,
            label,
            tone: connection_tone(connection.phase),
        },
        poll_warning,
        plan_version: view.plan_version().map(str::to_string),
        plan_notice: plan_notice(view),
    }
}

pub fn plan_notice(view: &TaskView) -> Option<PlanNotice> {
    if let Some(err) = view.plan_error() {
        return Some(PlanNotice::Invalid(err.to_string()));
    }
    if view.graph().is_empty() {
        if !view.has_snapshot() || view.status() == TaskStatus::Queued {
            return Some(PlanNotice::Pending);
        }
        return Some(PlanNotice::NoPlanningRequired);
    }
    view.plan_summary()
        .map(|s| PlanNotice::Summary(s.to_string()))
}
