use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("watch failed: {0}")]
    Watch(#[from] WatchError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Failures of a watch session's user-facing operations.
///
/// Source-level failures (a poll that timed out, a dropped socket) never
/// surface here; they are retried inside the sources.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("watch session already stopped")]
    Stopped,
    #[error("plan regenerate failed: {0}")]
    Regenerate(#[source] anyhow::Error),
    #[error("initial fetch failed: {0}")]
    InitialFetch(#[source] anyhow::Error),
}
