use chrono::{DateTime, Utc};
use serde::Serialize;

use super::style::{level_tone, Tone};
use crate::logs::LogFilter;
use crate::model::{LogEntry, LogLevel};
use crate::state::TaskView;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    pub id: String,
    pub level: LogLevel,
    pub tone: Tone,
    pub timestamp: DateTime<Utc>,
    /// `timestamp` rendered for display.
    pub time: String,
    /// `Step n`, when the line belongs to a step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// `[agent]`, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub message: String,
}

impl From<&LogEntry> for LogLine {
    fn from(entry: &LogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            level: entry.level,
            tone: level_tone(entry.level),
            timestamp: entry.timestamp,
            time: entry.timestamp.format(TIME_FORMAT).to_string(),
            step: entry.step_id.map(|id| format!("Step {id}")),
            agent: entry.agent.as_ref().map(|a| format!("[{a}]")),
            message: entry.message.clone(),
        }
    }
}

impl LogLine {
    /// Single-line rendering used by the plain output mode.
    pub fn to_plain(&self) -> String {
        let mut out = format!("{} {:<5}", self.time, self.level.as_str());
        if let Some(step) = &self.step {
            out.push(' ');
            out.push_str(step);
        }
        if let Some(agent) = &self.agent {
            out.push(' ');
            out.push_str(agent);
        }
        out.push_str("  ");
        out.push_str(&self.message);
        out
    }
}

pub fn log_lines(view: &TaskView, filter: &LogFilter) -> Vec<LogLine> {
    view.logs().filter(filter).iter().map(LogLine::from).collect()
}
