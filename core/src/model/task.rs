use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::log::LogEntry;
use super::serde_utils::{opt_string_or_number, opt_timestamp};
use super::status::TaskStatus;
use super::step::Step;

/// Full task state as returned by `GET /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Log lines the backend chose to embed in the snapshot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogEntry>,
}

impl TaskSnapshot {
    pub fn new(id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            status,
            prompt: String::new(),
            plan: None,
            result: None,
            created_at: None,
            updated_at: None,
            logs: Vec::new(),
        }
    }

    /// Plan steps, treating an empty list the same as no plan: the task
    /// store reports `[]` until a planner has run.
    pub fn plan_steps(&self) -> Option<&[Step]> {
        self.plan
            .as_ref()
            .map(|p| p.steps.as_slice())
            .filter(|s| !s.is_empty())
    }
}

/// An ordered step set plus optional planner metadata.
///
/// Decodes from either a bare step array or a `{steps, summary,
/// plan_version}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlanWire")]
pub struct Plan {
    pub steps: Vec<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Plan {
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            summary: None,
            version: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanWire {
    Steps(Vec<Step>),
    Document {
        #[serde(default)]
        steps: Vec<Step>,
        #[serde(default)]
        summary: Option<String>,
        #[serde(default, alias = "version", deserialize_with = "opt_string_or_number")]
        plan_version: Option<String>,
    },
}

impl From<PlanWire> for Plan {
    fn from(w: PlanWire) -> Self {
        match w {
            PlanWire::Steps(steps) => Plan::from_steps(steps),
            PlanWire::Document {
                steps,
                summary,
                plan_version,
            } => Plan {
                steps,
                summary,
                version: plan_version,
            },
        }
    }
}

/// One turn of the agent conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Structured task outcome. A bare string result becomes the summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResultWire")]
pub struct TaskResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversation: Vec<ConversationMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResultWire {
    Text(String),
    Structured {
        #[serde(default)]
        summary: Option<String>,
        #[serde(default)]
        conversation: Vec<ConversationMessage>,
        #[serde(default)]
        error: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<ResultWire> for TaskResult {
    fn from(w: ResultWire) -> Self {
        match w {
            ResultWire::Text(summary) => TaskResult {
                summary: Some(summary),
                ..TaskResult::default()
            },
            ResultWire::Structured {
                summary,
                conversation,
                error,
                extra,
            } => TaskResult {
                summary,
                conversation,
                error,
                extra,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_with_step_array_plan() {
        let raw = r#"{
            "id": "7f1c", "user_id": "u1", "status": "RUNNING", "prompt": "count words",
            "plan": [
                {"step_id": 1, "name": "read", "status": "COMPLETED", "dependencies": []},
                {"step_id": 2, "name": "count", "status": "RUNNING", "dependencies": [1]}
            ],
            "result": null,
            "created_at": "2024-05-01T10:00:00.000001",
            "updated_at": "2024-05-01T10:00:05+00:00"
        }"#;
        let snap: TaskSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap.status, TaskStatus::Running);
        assert_eq!(snap.plan_steps().map(|s| s.len()), Some(2));
        assert!(snap.result.is_none());
        assert!(snap.updated_at.is_some());
    }

    #[test]
    fn test_empty_plan_counts_as_absent() {
        let snap: TaskSnapshot =
            serde_json::from_str(r#"{"id":"t","status":"QUEUED","plan":[]}"#).unwrap();
        assert!(snap.plan.is_some());
        assert!(snap.plan_steps().is_none());
    }

    #[test]
    fn test_plan_document_shape() {
        let plan: Plan = serde_json::from_str(
            r#"{"summary":"two steps","plan_version":3,"steps":[{"step_id":1,"name":"a"}]}"#,
        )
        .unwrap();
        assert_eq!(plan.version.as_deref(), Some("3"));
        assert_eq!(plan.summary.as_deref(), Some("two steps"));
        assert_eq!(plan.steps.len(), 1);
    }

    #[test]
    fn test_result_text_and_structured() {
        let text: TaskResult = serde_json::from_str(r#""42 words""#).unwrap();
        assert_eq!(text.summary.as_deref(), Some("42 words"));

        let structured: TaskResult = serde_json::from_str(
            r#"{"summary":"ok","conversation":[{"name":"planner","role":"assistant","content":"hi"}],"tokens":12}"#,
        )
        .unwrap();
        assert_eq!(structured.conversation.len(), 1);
        assert_eq!(structured.extra.get("tokens"), Some(&Value::from(12)));
    }
}
