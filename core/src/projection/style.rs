use serde::Serialize;

use crate::model::{LogLevel, TaskStatus};
use crate::stream::ConnectionPhase;

/// Presentation-neutral color. Front-ends map it to their own palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Gray,
    Blue,
    Green,
    Yellow,
    Red,
}

pub fn status_tone(status: TaskStatus) -> Tone {
    match status {
        TaskStatus::Queued => Tone::Gray,
        TaskStatus::Running => Tone::Blue,
        TaskStatus::Completed => Tone::Green,
        TaskStatus::Failed => Tone::Red,
    }
}

pub fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Queued => "○",
        TaskStatus::Running => "◐",
        TaskStatus::Completed => "✓",
        TaskStatus::Failed => "✗",
    }
}

pub fn level_tone(level: LogLevel) -> Tone {
    match level {
        LogLevel::Error => Tone::Red,
        LogLevel::Warn => Tone::Yellow,
        LogLevel::Debug => Tone::Blue,
        LogLevel::Info => Tone::Gray,
    }
}

pub fn connection_tone(phase: ConnectionPhase) -> Tone {
    match phase {
        ConnectionPhase::Connected => Tone::Green,
        ConnectionPhase::Connecting | ConnectionPhase::Reconnecting => Tone::Yellow,
        ConnectionPhase::Disconnected => Tone::Gray,
    }
}
