//! View projection: pure functions from a [`TaskView`] to what a front-end
//! draws. Nothing here mutates state.

mod graph;
mod header;
mod logs;
mod style;

pub use graph::{
    edges, grid_position, nodes, EdgeView, Layout, NodeView, Position, COLUMN_WIDTH, ROW_HEIGHT,
};
pub use header::{header, plan_notice, ConnectionIndicator, Header, PlanNotice};
pub use logs::{log_lines, LogLine};
pub use style::{connection_tone, level_tone, status_icon, status_tone, Tone};

use serde::Serialize;

use crate::logs::LogFilter;
use crate::session::SourceHealth;
use crate::state::TaskView;
use crate::stream::ConnectionState;

/// Everything a front-end needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskProjection {
    pub header: Header,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub logs: Vec<LogLine>,
}

pub fn project(
    view: &TaskView,
    connection: &ConnectionState,
    health: &SourceHealth,
    filter: &LogFilter,
    layout: Layout,
) -> TaskProjection {
    TaskProjection {
        header: header(view, connection, health),
        nodes: nodes(view, layout),
        edges: edges(view),
        logs: log_lines(view, filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogEntry, LogLevel, Plan, Step, TaskSnapshot, TaskStatus};
    use crate::state::{Reconciler, ReconcileEvent};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn view_with(steps: Vec<Step>, status: TaskStatus) -> TaskView {
        let mut snap = TaskSnapshot::new("t", status);
        snap.plan = Some(Plan {
            steps,
            summary: Some("search then write".into()),
            version: Some("2".into()),
        });
        snap.logs = vec![
            LogEntry::new(
                LogLevel::Info,
                "fetching sources",
                Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            )
            .with_step(1)
            .with_agent("researcher"),
            LogEntry::new(
                LogLevel::Error,
                "rate limited",
                Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 5).unwrap(),
            ),
        ];
        let mut rec = Reconciler::new("t");
        rec.apply(ReconcileEvent::Snapshot(Box::new(snap)));
        rec.into_view()
    }

    fn four_steps() -> Vec<Step> {
        let mut steps = vec![
            Step::new(1, "search", vec![]),
            Step::new(2, "read", vec![1]),
            Step::new(3, "outline", vec![1]),
            Step::new(4, "write", vec![2, 3]),
        ];
        steps[0].status = TaskStatus::Completed;
        steps[1].status = TaskStatus::Running;
        steps
    }

    #[test]
    fn test_grid_positions_follow_step_order() {
        let view = view_with(four_steps(), TaskStatus::Running);
        let nodes = nodes(&view, Layout::Grid);
        let positions: Vec<(i32, i32)> = nodes.iter().map(|n| (n.position.x, n.position.y)).collect();
        assert_eq!(positions, vec![(0, 0), (200, 0), (400, 0), (0, 100)]);
        assert_eq!(nodes[0].label, "1. search");
        assert_eq!(nodes[0].tone, Tone::Green);
        assert_eq!(nodes[1].icon, "◐");
    }

    #[test]
    fn test_layered_positions_follow_stages() {
        let view = view_with(four_steps(), TaskStatus::Running);
        let positions: Vec<(i32, i32)> = nodes(&view, Layout::Layered)
            .iter()
            .map(|n| (n.position.x, n.position.y))
            .collect();
        assert_eq!(positions, vec![(0, 0), (200, 0), (200, 100), (400, 0)]);
    }

    #[test]
    fn test_edges_are_animated_into_running_steps() {
        let view = view_with(four_steps(), TaskStatus::Running);
        let edges = edges(&view);
        let ids: Vec<&str> = edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1-2", "1-3", "2-4", "3-4"]);
        assert!(edges[0].animated);
        assert!(!edges[1].animated);
    }

    #[test]
    fn test_log_lines_carry_step_and_agent() {
        let view = view_with(four_steps(), TaskStatus::Running);
        let lines = log_lines(&view, &LogFilter::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].step.as_deref(), Some("Step 1"));
        assert_eq!(lines[0].agent.as_deref(), Some("[researcher]"));
        assert_eq!(lines[1].tone, Tone::Red);
        assert_eq!(
            lines[0].to_plain(),
            "2024-05-01 10:00:00 INFO  Step 1 [researcher]  fetching sources"
        );

        let errors = log_lines(&view, &LogFilter::new("", Some(LogLevel::Error)));
        assert_eq!(errors.len(), 1);
        let text = log_lines(&view, &LogFilter::new("FETCH", None));
        assert_eq!(text.len(), 1);
    }

    #[test]
    fn test_header_counts_and_notice() {
        let view = view_with(four_steps(), TaskStatus::Running);
        let health = SourceHealth {
            poll_failures: 2,
            last_poll_error: Some("[timeout] request timed out".into()),
            ..SourceHealth::default()
        };
        let h = header(&view, &ConnectionState::default(), &health);
        assert_eq!(h.status_label, "RUNNING");
        assert_eq!((h.counts.completed, h.counts.running, h.counts.queued), (1, 1, 2));
        assert!((h.progress - 0.25).abs() < f64::EPSILON);
        assert_eq!(h.connection.label, "disconnected");
        assert_eq!(h.plan_version.as_deref(), Some("2"));
        assert_eq!(
            h.plan_notice,
            Some(PlanNotice::Summary("search then write".into()))
        );
        assert!(h.poll_warning.unwrap().contains("2x"));
    }

    #[test]
    fn test_empty_plan_means_no_planning_required() {
        let view = view_with(vec![], TaskStatus::Completed);
        assert_eq!(plan_notice(&view), Some(PlanNotice::NoPlanningRequired));
        assert_eq!(plan_notice(&TaskView::new("t")), Some(PlanNotice::Pending));
    }
}
