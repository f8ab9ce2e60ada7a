use async_trait::async_trait;

use crate::model::{TaskSnapshot, ToolCatalog};

/// Task backend reached over request/response.
#[async_trait]
pub trait TaskApi: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_task(&self, task_id: &str) -> anyhow::Result<TaskSnapshot>;
    /// Ask the planner for a new plan. Returns the new plan version when the
    /// backend reports one.
    async fn regenerate_plan(&self, task_id: &str) -> anyhow::Result<Option<String>>;
    async fn list_tools(&self) -> anyhow::Result<ToolCatalog>;
}
