//! 协调器输入事件定义

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    LogEntry, Plan, StepFields, StepId, StepStatus, TaskResult, TaskSnapshot, TaskStatus,
};

/// 协调器的唯一输入
///
/// `Snapshot` 来自轮询源，其余变体来自事件流。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileEvent {
    /// 某一时刻的完整任务状态
    Snapshot(Box<TaskSnapshot>),
    /// 单个步骤状态变更
    StepStatus(StepStatusChange),
    /// 日志行
    Log(LogEntry),
    /// 规划（重新）生成
    PlanGenerated(PlanGenerated),
    /// 事件流建立连接后的初始状态
    TaskState(TaskStateHint),
    /// 任务结束（终态）
    TaskEnd(TaskEnd),
}

impl ReconcileEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "snapshot",
            Self::StepStatus(_) => "step_status_update",
            Self::Log(_) => "log",
            Self::PlanGenerated(_) => "plan_generated",
            Self::TaskState(_) => "task_state",
            Self::TaskEnd(_) => "task_end",
        }
    }

    /// 是否来自事件流（增量事件）
    pub fn is_incremental(&self) -> bool {
        !matches!(self, Self::Snapshot(_))
    }
}

/// 步骤状态变更
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepStatusChange {
    pub step_id: StepId,
    pub status: StepStatus,
    /// 事件时间；消息未携带时为接收时间
    pub timestamp: DateTime<Utc>,
    pub fields: StepFields,
}

/// 新规划
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanGenerated {
    pub plan: Plan,
    pub timestamp: DateTime<Utc>,
}

/// 连接建立时服务端推送的任务状态（无时间戳）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStateHint {
    pub task_id: Option<String>,
    pub status: TaskStatus,
    pub plan: Option<Plan>,
}

/// 任务结束
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskEnd {
    pub status: TaskStatus,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// 单个事件的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 视图发生变化
    Changed,
    /// 事件合法但没有带来变化（例如重复日志）
    Unchanged,
    /// 事件被丢弃，附带原因
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_changed(self) -> bool {
        matches!(self, Outcome::Changed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// 事件属于其他任务
    OtherTask,
    /// 步骤不在当前规划中（旧规划的迟到事件）
    UnknownStep,
    /// 会让步骤状态倒退
    StaleStatus,
    /// 任务已处于终态
    TerminalLatched,
    /// 规划校验失败，保留旧规划
    InvalidPlan,
    /// 快照中的规划比事件流已安装的规划旧
    StalePlan,
}

impl IgnoreReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OtherTask => "other_task",
            Self::UnknownStep => "unknown_step",
            Self::StaleStatus => "stale_status",
            Self::TerminalLatched => "terminal_latched",
            Self::InvalidPlan => "invalid_plan",
            Self::StalePlan => "stale_plan",
        }
    }
}
