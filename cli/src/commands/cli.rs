use clap::{Args as ClapArgs, Parser, Subcommand};
use taskwatch_core::api::{Layout, LogLevel};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelArg {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LevelArg> for LogLevel {
    fn from(l: LevelArg) -> Self {
        match l {
            LevelArg::Debug => LogLevel::Debug,
            LevelArg::Info => LogLevel::Info,
            LevelArg::Warn => LogLevel::Warn,
            LevelArg::Error => LogLevel::Error,
        }
    }
}

/// Node placement for `show` output.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutArg {
    /// Three columns in plan order.
    #[default]
    Grid,
    /// One column per dependency stage.
    Layered,
}

impl From<LayoutArg> for Layout {
    fn from(l: LayoutArg) -> Self {
        match l {
            LayoutArg::Grid => Layout::Grid,
            LayoutArg::Layered => Layout::Layered,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "taskwatch", version, about = "Watch multi-step agent tasks")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Task API base URL (overrides config and TASKWATCH_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Event stream base URL, e.g. ws://host:8081.
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    /// Bearer token for the API and the event stream.
    #[arg(long, global = true)]
    pub token: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct WatchArgs {
    pub task_id: String,

    /// Print log lines and step changes instead of the full-screen view.
    #[arg(long)]
    pub no_tui: bool,

    /// Poll only; do not open the event stream.
    #[arg(long)]
    pub no_stream: bool,

    /// Initial log text filter (case-insensitive).
    #[arg(long)]
    pub filter: Option<String>,

    /// Only show log lines of this level.
    #[arg(long, value_enum)]
    pub level: Option<LevelArg>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ShowArgs {
    pub task_id: String,

    /// Print the full projection as JSON.
    #[arg(long)]
    pub json: bool,

    /// Node positions in the JSON output.
    #[arg(long, value_enum, default_value_t = LayoutArg::Grid)]
    pub layout: LayoutArg,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RegenerateArgs {
    pub task_id: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ToolsArgs {
    /// Only list tools whose name or description contains this text.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow a task until it finishes.
    Watch(WatchArgs),
    /// Fetch a task once and print it.
    Show(ShowArgs),
    /// Ask the backend for a new plan.
    Regenerate(RegenerateArgs),
    /// List the backend tool catalog.
    Tools(ToolsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_with_globals_after_subcommand() {
        let args = Args::try_parse_from([
            "taskwatch",
            "watch",
            "t1",
            "--level",
            "error",
            "--api-url",
            "http://tasks:8081",
            "--no-tui",
        ])
        .unwrap();
        assert_eq!(args.api_url.as_deref(), Some("http://tasks:8081"));
        let Commands::Watch(w) = args.command else {
            panic!("expected watch");
        };
        assert_eq!(w.task_id, "t1");
        assert!(w.no_tui);
        assert_eq!(w.level.map(LogLevel::from), Some(LogLevel::Error));
    }

    #[test]
    fn test_show_requires_task_id() {
        assert!(Args::try_parse_from(["taskwatch", "show"]).is_err());
        let args = Args::try_parse_from(["taskwatch", "show", "t9", "--json"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Show(ShowArgs { json: true, layout: LayoutArg::Grid, .. })
        ));

        let args =
            Args::try_parse_from(["taskwatch", "show", "t9", "--layout", "layered"]).unwrap();
        let Commands::Show(show) = args.command else {
            panic!("expected show");
        };
        assert_eq!(Layout::from(show.layout), Layout::Layered);
    }
}
