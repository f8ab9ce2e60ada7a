//! CLI 应用装配层：合并命令行覆盖、构建 plugins，并在各子命令与 plain/TUI watch flow 之间分发。
use std::sync::Arc;

use taskwatch_core::api as core_api;
use taskwatch_core::api::CliError;

use crate::commands::cli::{Args, Commands, RegenerateArgs, ShowArgs, ToolsArgs, WatchArgs};
use crate::flow::{plain, tui};

/// CLI flags win over env overrides and config files.
pub fn apply_overrides(cfg: &mut core_api::AppConfig, args: &Args) {
    if let Some(url) = args.api_url.as_deref().filter(|s| !s.trim().is_empty()) {
        cfg.api.base_url = url.to_string();
    }
    if let Some(url) = args.ws_url.as_deref().filter(|s| !s.trim().is_empty()) {
        cfg.api.ws_url = url.to_string();
    }
    if let Some(token) = &args.token {
        cfg.api.token = token.clone();
    }
    if let Commands::Watch(WatchArgs { no_stream: true, .. }) = args.command {
        cfg.stream.enabled = false;
    }
}

/// Whether `watch` takes over the terminal.
pub fn wants_tui(cfg: &core_api::AppConfig, args: &Args) -> bool {
    match &args.command {
        Commands::Watch(w) if !w.no_tui && cfg.tui.enabled => {
            match crate::tui::check_tui_support() {
                Ok(()) => true,
                Err(reason) => {
                    tracing::debug!(target: "taskwatch.cli", stage = "cli.tui.disabled", reason = %reason);
                    false
                }
            }
        }
        _ => false,
    }
}

#[tracing::instrument(name = "cli.dispatch", skip_all)]
pub async fn dispatch(args: Args, cfg: core_api::AppConfig, use_tui: bool) -> Result<i32, CliError> {
    let api = taskwatch_plugins::factory::build_task_api(&cfg)
        .map_err(|e| CliError::Config(format!("{e:#}")))?;

    match args.command {
        Commands::Watch(watch) => {
            let connector = taskwatch_plugins::factory::build_connector(&cfg);
            if use_tui {
                tui::run_tui_flow(&watch, &cfg, api, connector).await
            } else {
                plain::run_plain_flow(&watch, &cfg, api, connector).await
            }
        }
        Commands::Show(show) => run_show(&show, api).await,
        Commands::Regenerate(regen) => run_regenerate(&regen, api).await,
        Commands::Tools(tools) => run_tools(&tools, api).await,
    }
}

async fn run_show(args: &ShowArgs, api: Arc<dyn core_api::TaskApi>) -> Result<i32, CliError> {
    let snapshot = api
        .fetch_task(&args.task_id)
        .await
        .map_err(|e| CliError::Backend(format!("{e:#}")))?;
    let (status, projection) = snapshot_projection(&args.task_id, snapshot, args.layout.into());
    if args.json {
        let out = serde_json::to_string_pretty(&projection)
            .map_err(|e| CliError::Command(format!("encode projection failed: {e}")))?;
        println!("{out}");
    } else {
        for line in plain::render_summary(&projection) {
            println!("{line}");
        }
        for line in &projection.logs {
            println!("{}", line.to_plain());
        }
    }
    Ok(exit_code_for_status(status))
}

/// Project a single fetched snapshot, with no live sources behind it.
fn snapshot_projection(
    task_id: &str,
    snapshot: core_api::TaskSnapshot,
    layout: core_api::Layout,
) -> (core_api::TaskStatus, core_api::TaskProjection) {
    let mut view = core_api::TaskView::new(task_id);
    core_api::apply(&mut view, core_api::ReconcileEvent::Snapshot(Box::new(snapshot)));
    let projection = core_api::project(
        &view,
        &core_api::ConnectionState::default(),
        &core_api::SourceHealth::default(),
        &core_api::LogFilter::default(),
        layout,
    );
    (view.status(), projection)
}

async fn run_regenerate(
    args: &RegenerateArgs,
    api: Arc<dyn core_api::TaskApi>,
) -> Result<i32, CliError> {
    let version = api
        .regenerate_plan(&args.task_id)
        .await
        .map_err(|e| CliError::Backend(format!("{e:#}")))?;
    match version {
        Some(v) => println!("plan regenerated: version {v}"),
        None => println!("plan regenerate requested"),
    }
    Ok(0)
}

async fn run_tools(args: &ToolsArgs, api: Arc<dyn core_api::TaskApi>) -> Result<i32, CliError> {
    let catalog = api
        .list_tools()
        .await
        .map_err(|e| CliError::Backend(format!("{e:#}")))?;
    let term = args.search.as_deref().unwrap_or("");
    for tool in catalog.tools.iter().filter(|t| t.matches(term)) {
        let state = if tool.enabled { "" } else { " (disabled)" };
        println!("{:<24} {:<12} {}{}", tool.name, tool.category, tool.description, state);
    }
    Ok(0)
}

/// 0 for a completed task, 1 for a failed one, 0 while still running.
pub fn exit_code_for_status(status: core_api::TaskStatus) -> i32 {
    match status {
        core_api::TaskStatus::Failed => 1,
        _ => 0,
    }
}
