//! TUI watch 流程：打开会话、接管终端、运行界面循环，退出时恢复终端并停止会话。
use std::sync::Arc;

use taskwatch_core::api as core_api;
use taskwatch_core::api::{CliError, LogFilter};

use crate::app::exit_code_for_status;
use crate::commands::cli::WatchArgs;
use crate::tui::{restore_terminal, run_watch_tui, setup_terminal, TuiApp};

pub async fn run_tui_flow(
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

    let mut app = TuiApp::new(cfg.tui.clone(), args.task_id.clone(), filter);
    let mut terminal = setup_terminal().map_err(CliError::Command)?;
    let result = run_watch_tui(&mut terminal, &mut app, &handle).await;
    restore_terminal(&mut terminal);

    let status = handle.view().borrow().status();
    handle.stop().await;
    tracing::debug!(target: "taskwatch.cli", stage = "cli.tui.exit", status = %status);
    result?;
    Ok(exit_code_for_status(status))
}
