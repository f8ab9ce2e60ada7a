//! # 状态协调模块
//!
//! 轮询快照与事件流增量在这里合并成一个一致的 [`TaskView`]。
//!
//! ## 合并规则
//!
//! 1. **单调前进**：增量事件不会让步骤回到更早的阶段，终态不可更改
//! 2. **快照带时间**：较低阶段的快照只有在比最后一次增量事件更新时才生效
//! 3. **终态锁定**：任务的首个终态（task_end 或终态快照）之后状态不再变化
//! 4. **规划校验**：非法规划被拒绝，旧规划保持生效
//! 5. **日志幂等**：同一 id 的日志只出现一次

pub mod reconciler;
pub mod transitions;
pub mod types;

pub use reconciler::{apply, reduce, ReconcileStats, Reconciler, TaskView};
pub use transitions::{StateTransition, TransitionError};
pub use types::{
    IgnoreReason, Outcome, PlanGenerated, ReconcileEvent, StepStatusChange, TaskEnd,
    TaskStateHint,
};
