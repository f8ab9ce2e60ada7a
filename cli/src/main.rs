use clap::Parser;
use taskwatch_cli::app;
use taskwatch_cli::commands::cli;
use taskwatch_core::api::{CliError, LoggingConfig, WatchError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let mut cfg =
        taskwatch_core::config::load_default().map_err(|e| CliError::Config(e.to_string()))?;
    app::apply_overrides(&mut cfg, &args);

    let use_tui = app::wants_tui(&cfg, &args);
    // stderr belongs to the TUI while it runs
    init_tracing(&cfg.logging, !use_tui).map_err(CliError::Config)?;
    tracing::debug!(
        target: "taskwatch.cli",
        stage = "cli.start",
        api = %cfg.api.base_url,
        stream = cfg.stream.enabled,
        tui = use_tui
    );

    app::dispatch(args, cfg, use_tui).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success (1: the watched task FAILED, returned as a normal exit code)
    // 11: config error
    // 20: network / IO error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Watch(we) => match we {
            WatchError::InitialFetch(_) | WatchError::Regenerate(_) => 20,
            WatchError::Stopped => 50,
        },
        CliError::Backend(_) => 20,
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &LoggingConfig, console: bool) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("taskwatch"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("taskwatch.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    let console = console && logging.console;
    if !console && maybe_writer.is_none() {
        return Ok(());
    }

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
