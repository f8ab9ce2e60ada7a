use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::serde_utils::opt_timestamp;
use super::step::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "WARNING")]
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// A single timestamped log line.
///
/// Decoding never fails on a missing `id` or `timestamp`: the timestamp
/// defaults to the decode time (the stream decoder supplies the envelope
/// timestamp instead) and the id is derived from the entry content,
/// so the same line delivered by the poll snapshot and the event stream
/// collapses into one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LogEntryWire")]
pub struct LogEntry {
    pub id: String,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl LogEntry {
    /// Build an entry with a content-derived id.
    pub fn new(level: LogLevel, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let mut entry = Self {
            id: String::new(),
            level,
            message: message.into(),
            timestamp,
            step_id: None,
            agent: None,
        };
        entry.id = entry.derived_id();
        entry
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_step(mut self, step_id: StepId) -> Self {
        self.step_id = Some(step_id);
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    fn derived_id(&self) -> String {
        let key = format!(
            "{}|{}|{}|{}|{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.level,
            self.step_id.map(|s| s.to_string()).unwrap_or_default(),
            self.agent.as_deref().unwrap_or_default(),
            self.message
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }
}

#[derive(Deserialize)]
pub(crate) struct LogEntryWire {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    level: LogLevel,
    #[serde(default)]
    message: String,
    #[serde(default, deserialize_with = "opt_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    step_id: Option<StepId>,
    #[serde(default)]
    agent: Option<String>,
}

impl LogEntryWire {
    /// Finish decoding; `fallback` stands in for a missing timestamp before
    /// the id is derived.
    pub(crate) fn into_entry(self, fallback: DateTime<Utc>) -> LogEntry {
        let mut entry = LogEntry {
            id: String::new(),
            level: self.level,
            message: self.message,
            timestamp: self.timestamp.unwrap_or(fallback),
            step_id: self.step_id,
            agent: self.agent,
        };
        entry.id = match self.id {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => entry.derived_id(),
        };
        entry
    }
}

impl From<LogEntryWire> for LogEntry {
    fn from(w: LogEntryWire) -> Self {
        w.into_entry(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_is_derived_deterministically() {
        let raw = r#"{"level":"INFO","message":"step 1 started","timestamp":"2024-05-01T10:00:00Z","step_id":1}"#;
        let a: LogEntry = serde_json::from_str(raw).unwrap();
        let b: LogEntry = serde_json::from_str(raw).unwrap();
        assert!(!a.id.is_empty());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_explicit_id_is_kept() {
        let e: LogEntry =
            serde_json::from_str(r#"{"id":"log-7","level":"WARNING","message":"slow"}"#).unwrap();
        assert_eq!(e.id, "log-7");
        assert_eq!(e.level, LogLevel::Warn);
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let e: LogEntry = serde_json::from_str(r#"{"id":42,"message":"x"}"#).unwrap();
        assert_eq!(e.id, "42");
        assert_eq!(e.level, LogLevel::Info);
    }
}
