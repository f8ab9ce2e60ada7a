use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Execution status shared by tasks and steps.
///
/// Stages are ordered `Queued < Running < {Completed, Failed}`; the two
/// terminal variants share a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

/// Steps use the same status vocabulary as tasks.
pub type StepStatus = TaskStatus;

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Queued,
        TaskStatus::Running,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    pub fn stage(self) -> u8 {
        match self {
            TaskStatus::Queued => 0,
            TaskStatus::Running => 1,
            TaskStatus::Completed | TaskStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether the poll source keeps fetching while the task is in this state.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "QUEUED",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => Ok(TaskStatus::Queued),
            "RUNNING" => Ok(TaskStatus::Running),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(TaskStatus::Queued.stage() < TaskStatus::Running.stage());
        assert!(TaskStatus::Running.stage() < TaskStatus::Completed.stage());
        assert_eq!(TaskStatus::Completed.stage(), TaskStatus::Failed.stage());
    }

    #[test]
    fn test_wire_names() {
        let s: TaskStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(s, TaskStatus::Running);
        assert!(serde_json::from_str::<TaskStatus>("\"PAUSED\"").is_err());
        assert_eq!("failed".parse::<TaskStatus>().unwrap(), TaskStatus::Failed);
    }
}
