//! 步骤状态合并规则
//!
//! 增量事件（事件流）和完整快照（轮询）对同一步骤的状态可能给出不同的答案，
//! 这里决定保留哪一个。

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{StepStatus, TaskStatus};

/// 合并被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("step would move back from {from} to {to}")]
    Regression { from: StepStatus, to: StepStatus },
    #[error("step already finished as {state}")]
    FromTerminalState { state: StepStatus },
}

/// 合并规则
pub struct StateTransition;

impl StateTransition {
    /// 增量事件：只允许前进，终态不可更改
    pub fn validate(from: StepStatus, to: StepStatus) -> Result<(), TransitionError> {
        if from == to {
            return Ok(());
        }
        // COMPLETED / FAILED 互相之间也不能切换
        if from.is_terminal() {
            return Err(TransitionError::FromTerminalState { state: from });
        }
        if to.stage() < from.stage() {
            return Err(TransitionError::Regression { from, to });
        }
        Ok(())
    }

    /// 快照：阶段不低于当前状态时直接采用；否则只有在该步骤没有增量历史，
    /// 或快照的 `updated_at` 严格晚于最后一次增量事件时才采用。
    pub fn snapshot_wins(
        current: StepStatus,
        snapshot: StepStatus,
        last_incremental: Option<DateTime<Utc>>,
        snapshot_updated_at: Option<DateTime<Utc>>,
    ) -> bool {
        if Self::validate(current, snapshot).is_ok() {
            return true;
        }
        match (last_incremental, snapshot_updated_at) {
            (None, _) => true,
            (Some(seen), Some(updated)) => updated > seen,
            // 没有时间戳的快照不能覆盖增量进度
            (Some(_), None) => false,
        }
    }

    /// 任务状态：首个终态锁定
    pub fn task_status(
        latched: bool,
        current: TaskStatus,
        incoming: TaskStatus,
    ) -> Option<TaskStatus> {
        if latched || current == incoming {
            None
        } else {
            Some(incoming)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, secs).unwrap())
    }

    #[test]
    fn test_forward_moves_are_valid() {
        use TaskStatus::*;
        assert!(StateTransition::validate(Queued, Running).is_ok());
        assert!(StateTransition::validate(Queued, Completed).is_ok());
        assert!(StateTransition::validate(Running, Failed).is_ok());
        assert!(StateTransition::validate(Running, Running).is_ok());
    }

    #[test]
    fn test_backward_and_terminal_moves_are_rejected() {
        use TaskStatus::*;
        assert_eq!(
            StateTransition::validate(Running, Queued),
            Err(TransitionError::Regression {
                from: Running,
                to: Queued
            })
        );
        assert_eq!(
            StateTransition::validate(Completed, Failed),
            Err(TransitionError::FromTerminalState { state: Completed })
        );
        assert!(StateTransition::validate(Failed, Running).is_err());
    }

    #[test]
    fn test_stale_snapshot_loses_to_incremental() {
        use TaskStatus::*;
        assert!(!StateTransition::snapshot_wins(Running, Queued, at(5), at(3)));
        assert!(!StateTransition::snapshot_wins(Running, Queued, at(5), at(5)));
        assert!(!StateTransition::snapshot_wins(Running, Queued, at(5), None));
    }

    #[test]
    fn test_newer_snapshot_or_no_history_wins() {
        use TaskStatus::*;
        assert!(StateTransition::snapshot_wins(Running, Queued, at(5), at(6)));
        assert!(StateTransition::snapshot_wins(Completed, Running, None, None));
        assert!(StateTransition::snapshot_wins(Queued, Completed, at(9), at(1)));
    }

    #[test]
    fn test_task_status_latch() {
        use TaskStatus::*;
        assert_eq!(StateTransition::task_status(false, Queued, Running), Some(Running));
        assert_eq!(StateTransition::task_status(false, Running, Running), None);
        assert_eq!(StateTransition::task_status(true, Failed, Running), None);
    }
}
