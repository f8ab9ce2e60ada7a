//! Wire and in-memory types shared by every layer.
//!
//! Types here are plain data: they know how to decode themselves from the
//! backend's loose JSON shapes but carry no merge logic.

mod log;
mod serde_utils;
mod status;
mod step;
mod task;
mod tool;

pub use log::{LogEntry, LogLevel};
pub(crate) use log::LogEntryWire;
pub use serde_utils::parse_timestamp;
pub(crate) use serde_utils::{opt_string_or_number, opt_timestamp};
pub use status::{StepStatus, TaskStatus};
pub use step::{Step, StepFields, StepId};
pub use task::{ConversationMessage, Plan, TaskResult, TaskSnapshot};
pub use tool::{ToolCatalog, ToolInfo};
