use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::serde_utils::opt_timestamp;
use super::status::StepStatus;

/// Stable step identifier, unique within one task.
pub type StepId = u32;

/// One node of a task plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: StepId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: StepStatus,
    /// Steps that must reach COMPLETED before this one leaves QUEUED.
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_parameters: Option<Value>,
    #[serde(
        default,
        alias = "start_time",
        deserialize_with = "opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "end_time",
        deserialize_with = "opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_preview: Option<String>,
}

impl Step {
    pub fn new(step_id: StepId, name: impl Into<String>, dependencies: Vec<StepId>) -> Self {
        Self {
            step_id,
            name: name.into(),
            description: String::new(),
            status: StepStatus::Queued,
            dependencies,
            agent: None,
            tool_name: None,
            tool_parameters: None,
            started_at: None,
            completed_at: None,
            retry_count: 0,
            result_preview: None,
        }
    }

    /// Copy execution state (status, timestamps, counters) from a previous
    /// incarnation of the same step id.
    pub(crate) fn carry_forward_from(&mut self, prev: &Step) {
        self.status = prev.status;
        self.started_at = self.started_at.or(prev.started_at);
        self.completed_at = self.completed_at.or(prev.completed_at);
        self.retry_count = self.retry_count.max(prev.retry_count);
        if self.result_preview.is_none() {
            self.result_preview = prev.result_preview.clone();
        }
        if self.agent.is_none() {
            self.agent = prev.agent.clone();
        }
    }

    /// Overwrite the optional fields that are present in `fields`.
    pub(crate) fn merge_fields(&mut self, fields: &StepFields) {
        if let Some(agent) = &fields.agent {
            self.agent = Some(agent.clone());
        }
        if let Some(tool) = &fields.tool_name {
            self.tool_name = Some(tool.clone());
        }
        if let Some(params) = &fields.tool_parameters {
            self.tool_parameters = Some(params.clone());
        }
        if fields.started_at.is_some() {
            self.started_at = fields.started_at;
        }
        if fields.completed_at.is_some() {
            self.completed_at = fields.completed_at;
        }
        if let Some(retries) = fields.retry_count {
            self.retry_count = retries;
        }
        if let Some(preview) = &fields.result_preview {
            self.result_preview = Some(preview.clone());
        }
    }
}

/// Optional per-step fields carried by a status change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_parameters: Option<Value>,
    #[serde(
        default,
        alias = "start_time",
        deserialize_with = "opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "end_time",
        deserialize_with = "opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_preview: Option<String>,
}

impl From<&Step> for StepFields {
    fn from(step: &Step) -> Self {
        Self {
            agent: step.agent.clone(),
            tool_name: step.tool_name.clone(),
            tool_parameters: step.tool_parameters.clone(),
            started_at: step.started_at,
            completed_at: step.completed_at,
            retry_count: Some(step.retry_count),
            result_preview: step.result_preview.clone(),
        }
    }
}
