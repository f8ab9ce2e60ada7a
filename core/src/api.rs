//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskwatch_core::api` instead of reaching into internal modules.

pub use crate::config::{
    get_taskwatch_data_dir, load_default, ApiConfig, AppConfig, LoggingConfig, PollConfig,
    StreamConfig, TuiConfig,
};
pub use crate::error::{CliError, ConnectionError, DecodeError, PlanError, WatchError};
pub use crate::graph::{stages, validate_plan, Edge, StatusCounts, StepGraph};
pub use crate::logs::{LogBuffer, LogFilter, LogView};
pub use crate::model::{
    parse_timestamp, ConversationMessage, LogEntry, LogLevel, Plan, Step, StepId, StepStatus,
    TaskResult, TaskSnapshot, TaskStatus, ToolCatalog, ToolInfo,
};
pub use crate::poll::{PollCommand, PollSource, DEFAULT_POLL_INTERVAL};
pub use crate::projection::{
    edges, header, log_lines, nodes, plan_notice, project, EdgeView, Header, Layout, LogLine,
    NodeView, PlanNotice, TaskProjection, Tone, COLUMN_WIDTH,
};
pub use crate::session::{SessionConfig, SourceHealth, WatchHandle, WatchSession};
pub use crate::source::{SourceEvent, SourceKind, SourceSignal, TaskApi};
pub use crate::state::{
    apply, reduce, IgnoreReason, Outcome, ReconcileEvent, Reconciler, TaskView,
};
pub use crate::stream::{
    decode_message, stream_path, Backoff, ConnectionPhase, ConnectionState, EventConnector,
    FrameStream, StreamSource,
};
