mod app;
mod events;
mod ui;

use std::io;
use std::time::Duration;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use futures::future::{FutureExt, LocalBoxFuture};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use taskwatch_core::api as core_api;
use taskwatch_core::api::{CliError, WatchError, WatchHandle};

pub use app::{InputMode, KeyAction, TuiApp};

pub fn check_tui_support() -> Result<(), String> {
    if !atty::is(atty::Stream::Stdout) {
        return Err("stdout is not a terminal".to_string());
    }
    if !cfg!(windows) && std::env::var("TERM").is_err() {
        return Err("TERM environment variable not set".to_string());
    }
    let (width, height) = terminal::size().map_err(|e| format!("terminal size failed: {e}"))?;
    if width < 80 || height < 20 {
        return Err(format!(
            "terminal too small ({}x{}), need at least 80x20",
            width, height
        ));
    }
    Ok(())
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>, String> {
    enable_raw_mode().map_err(|e| e.to_string())?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).map_err(|e| e.to_string())?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.to_string())
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

/// Redraw on every view/health/connection change and on the tick until the
/// user quits. The session keeps running after the task finishes so the
/// final state stays on screen.
pub async fn run_watch_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
    handle: &WatchHandle,
) -> Result<(), CliError> {
    let (input_reader, mut input_rx) = events::InputReader::start();
    let mut view_rx = handle.view();
    let mut health_rx = handle.health();
    let mut conn_rx = handle.connection();
    let mut tick =
        tokio::time::interval(Duration::from_millis(app.config.update_interval_ms.max(16)));
    let mut regen: Option<LocalBoxFuture<'_, Result<Option<String>, WatchError>>> = None;

    let result = loop {
        tokio::select! {
            Some(key) = input_rx.recv() => match app.handle_key(key) {
                KeyAction::Quit => break Ok(()),
                KeyAction::Regenerate if regen.is_none() => {
                    app.regenerate_started();
                    regen = Some(handle.regenerate_plan().boxed_local());
                }
                _ => {}
            },
            res = async {
                match regen.as_mut() {
                    Some(fut) => fut.await,
                    None => std::future::pending().await,
                }
            } => {
                regen = None;
                let notice = match res {
                    Ok(Some(v)) => format!("plan regenerated (version {v})"),
                    Ok(None) => "plan regenerate requested".to_string(),
                    Err(err) => {
                        tracing::warn!(target: "taskwatch.cli", stage = "cli.regenerate", error = %err);
                        format!("regenerate failed: {err}")
                    }
                };
                app.regenerate_finished(notice);
            }
            Ok(()) = view_rx.changed() => {}
            Ok(()) = health_rx.changed() => {}
            Ok(()) = conn_rx.changed() => {}
            _ = tick.tick() => {}
        }

        let projection = {
            let view = view_rx.borrow_and_update();
            core_api::project(
                &view,
                &conn_rx.borrow_and_update(),
                &health_rx.borrow_and_update(),
                &app.filter,
                core_api::Layout::Layered,
            )
        };
        if let Err(err) = terminal.draw(|f| ui::draw(f, app, &projection)) {
            break Err(CliError::Io(err));
        }
    };

    input_reader.stop();
    result
}
