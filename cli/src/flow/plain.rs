//! 非 TUI 的 watch 流程：打开会话，逐行打印状态变化与新日志，任务进入终态后退出。
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use taskwatch_core::api as core_api;
use taskwatch_core::api::{CliError, LogFilter, StepId, StepStatus, TaskProjection, TaskStatus};

use crate::app::exit_code_for_status;
use crate::commands::cli::WatchArgs;

pub async fn run_plain_flow(
    args: &WatchArgs,
    cfg: &core_api::AppConfig,
    api: Arc<dyn core_api::TaskApi>,
    connector: Option<Arc<dyn core_api::EventConnector>>,
) -> Result<i32, CliError> {
    let filter = LogFilter::new(
        args.filter.clone().unwrap_or_default(),
        args.level.map(Into::into),
    );
    let handle =
        core_api::WatchSession::open(args.task_id.clone(), api, connector, cfg.session_config())
            .await?;
    let mut view_rx = handle.view();
    let mut health_rx = handle.health();
    let conn_rx = handle.connection();
    let mut printer = PlainPrinter::new(filter);

    let status = loop {
        let (status, terminal) = {
            let view = view_rx.borrow_and_update();
            let health = health_rx.borrow_and_update().clone();
            let projection = core_api::project(
                &view,
                &conn_rx.borrow(),
                &health,
                printer.filter(),
                core_api::Layout::Layered,
            );
            for line in printer.update(&projection) {
                println!("{line}");
            }
            (view.status(), view.is_terminal())
        };
        if terminal {
            break status;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "taskwatch.cli", stage = "cli.watch.interrupted", task_id = %args.task_id);
                break status;
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break status;
                }
            }
            changed = health_rx.changed() => {
                if changed.is_err() {
                    break status;
                }
            }
        }
    };

    handle.stop().await;
    Ok(exit_code_for_status(status))
}

/// One-shot textual summary: header, plan notice and the step list.
pub fn render_summary(p: &TaskProjection) -> Vec<String> {
    let h = &p.header;
    let mut out = vec![format!(
        "{} {} {}  {}/{} steps",
        h.icon,
        h.task_id,
        h.status_label,
        h.counts.finished(),
        h.counts.total()
    )];
    if !h.prompt.is_empty() {
        out.push(format!("  prompt: {}", h.prompt));
    }
    if let Some(notice) = &h.plan_notice {
        out.push(format!("  plan: {}", notice.text()));
    }
    for node in &p.nodes {
        out.push(format!("  {}", node_line(node)));
    }
    out
}

fn node_line(node: &core_api::NodeView) -> String {
    let mut line = format!("{} {}", node.icon, node.label);
    if let Some(agent) = &node.agent {
        line.push_str(&format!(" [{agent}]"));
    }
    if let Some(tool) = &node.tool {
        line.push_str(&format!(" ({tool})"));
    }
    line
}

/// Turns successive projections into the lines that changed since the
/// previous one.
pub struct PlainPrinter {
    filter: LogFilter,
    task_status: Option<TaskStatus>,
    plan_key: Option<(Option<String>, Vec<StepId>)>,
    steps: HashMap<StepId, StepStatus>,
    printed_logs: HashSet<String>,
    poll_warning: Option<String>,
}

impl PlainPrinter {
    pub fn new(filter: LogFilter) -> Self {
        Self {
            filter,
            task_status: None,
            plan_key: None,
            steps: HashMap::new(),
            printed_logs: HashSet::new(),
            poll_warning: None,
        }
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    pub fn update(&mut self, p: &TaskProjection) -> Vec<String> {
        let mut out = Vec::new();
        let h = &p.header;

        let plan_key = (
            h.plan_version.clone(),
            p.nodes.iter().map(|n| n.id).collect::<Vec<_>>(),
        );
        if self.plan_key.as_ref() != Some(&plan_key) {
            let first = self.plan_key.is_none();
            out.extend(render_summary(p));
            if !first {
                out.insert(0, "plan changed".to_string());
            }
            self.plan_key = Some(plan_key);
            self.task_status = Some(h.status);
            self.steps = p.nodes.iter().map(|n| (n.id, n.status)).collect();
        } else {
            if self.task_status != Some(h.status) {
                out.push(format!("{} task {}", h.icon, h.status_label));
                self.task_status = Some(h.status);
            }
            for node in &p.nodes {
                if self.steps.insert(node.id, node.status) != Some(node.status) {
                    out.push(format!("{} step {}", node.icon, node.label));
                }
            }
        }

        if h.poll_warning != self.poll_warning {
            if let Some(w) = &h.poll_warning {
                out.push(format!("! {w}"));
            }
            self.poll_warning = h.poll_warning.clone();
        }

        for line in &p.logs {
            if self.printed_logs.insert(line.id.clone()) {
                out.push(line.to_plain());
            }
        }
        out
    }
}
