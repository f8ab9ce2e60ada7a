//! Stream message decoding.
//!
//! Every frame is a `{type, payload}` envelope. Decoding is the only place
//! where raw JSON is inspected; the reconciler only ever sees typed events.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::model::{
    opt_string_or_number, opt_timestamp, parse_timestamp, LogEntryWire, Plan, StepFields, StepId,
    StepStatus, TaskResult, TaskStatus,
};
use crate::state::{PlanGenerated, ReconcileEvent, StepStatusChange, TaskEnd, TaskStateHint};

#[derive(Deserialize)]
struct StepStatusPayload {
    step_id: StepId,
    status: StepStatus,
    #[serde(default, deserialize_with = "opt_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    fields: StepFields,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanPayload {
    Wrapped {
        plan: Plan,
        #[serde(default, deserialize_with = "opt_timestamp")]
        timestamp: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "opt_string_or_number")]
        plan_version: Option<String>,
    },
    Bare(Plan),
}

#[derive(Deserialize)]
struct TaskStatePayload {
    #[serde(default)]
    task_id: Option<String>,
    status: TaskStatus,
    #[serde(default)]
    plan: Option<Plan>,
}

#[derive(Deserialize)]
struct TaskEndPayload {
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    result: Option<TaskResult>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    timestamp: Option<DateTime<Utc>>,
}

fn payload<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::InvalidPayload {
        kind,
        reason: e.to_string(),
    })
}

/// Decode one text frame.
///
/// `received_at` stands in for event timestamps the message does not carry
/// (neither in the payload nor on the envelope).
pub fn decode_message(text: &str, received_at: DateTime<Utc>) -> Result<ReconcileEvent, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(DecodeError::NotAnObject);
    };
    let kind = match envelope.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(DecodeError::MissingType),
    };
    let envelope_ts = envelope
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    let at = |ts: Option<DateTime<Utc>>| ts.or(envelope_ts).unwrap_or(received_at);
    let body = envelope.remove("payload").unwrap_or(Value::Null);

    match kind.as_str() {
        "step_status_update" => {
            let p: StepStatusPayload = payload("step_status_update", body)?;
            Ok(ReconcileEvent::StepStatus(StepStatusChange {
                step_id: p.step_id,
                status: p.status,
                timestamp: at(p.timestamp),
                fields: p.fields,
            }))
        }
        "log" => {
            let wire: LogEntryWire = payload("log", body)?;
            let fallback = at(None);
            Ok(ReconcileEvent::Log(wire.into_entry(fallback)))
        }
        "plan_generated" => {
            let (mut plan, ts, version) = match payload("plan_generated", body)? {
                PlanPayload::Wrapped {
                    plan,
                    timestamp,
                    plan_version,
                } => (plan, timestamp, plan_version),
                PlanPayload::Bare(plan) => (plan, None, None),
            };
            if plan.version.is_none() {
                plan.version = version;
            }
            Ok(ReconcileEvent::PlanGenerated(PlanGenerated {
                plan,
                timestamp: at(ts),
            }))
        }
        "task_state" => {
            let p: TaskStatePayload = payload("task_state", body)?;
            Ok(ReconcileEvent::TaskState(TaskStateHint {
                task_id: p.task_id,
                status: p.status,
                plan: p.plan,
            }))
        }
        "task_end" => {
            let p: TaskEndPayload = payload("task_end", body)?;
            let error = p
                .error
                .or_else(|| p.result.as_ref().and_then(|r| r.error.clone()));
            let status = match p.status {
                Some(status) if status.is_terminal() => status,
                Some(status) => {
                    return Err(DecodeError::InvalidPayload {
                        kind: "task_end",
                        reason: format!("non-terminal status {status}"),
                    })
                }
                None if error.is_some() => TaskStatus::Failed,
                None => TaskStatus::Completed,
            };
            Ok(ReconcileEvent::TaskEnd(TaskEnd {
                status,
                result: p.result,
                error,
                timestamp: at(p.timestamp),
            }))
        }
        _ => Err(DecodeError::UnknownType(kind)),
    }
}
