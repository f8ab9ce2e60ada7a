#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::{stream, StreamExt};
use serde_json::json;

use taskwatch_core::api::{
    EventConnector, FrameStream, Plan, SessionConfig, Step, TaskApi, TaskSnapshot, TaskStatus,
    ToolCatalog,
};

pub fn at(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::seconds(secs as i64)
}

pub fn three_step_snapshot(status: TaskStatus, updated: u32) -> TaskSnapshot {
    let mut snap = TaskSnapshot::new("task-1", status);
    snap.prompt = "summarise the quarterly report".into();
    snap.plan = Some(Plan {
        steps: vec![
            Step::new(1, "fetch", vec![]),
            Step::new(2, "analyse", vec![1]),
            Step::new(3, "write", vec![2]),
        ],
        summary: Some("fetch, analyse, write".into()),
        version: Some("1".into()),
    });
    snap.updated_at = Some(at(updated));
    snap
}

pub fn step_frame(step_id: u32, status: &str, secs: u32) -> String {
    json!({
        "type": "step_status_update",
        "payload": {"step_id": step_id, "status": status, "timestamp": at(secs).to_rfc3339()}
    })
    .to_string()
}

pub fn log_frame(message: &str, secs: u32) -> String {
    json!({
        "type": "log",
        "payload": {"level": "INFO", "message": message, "timestamp": at(secs).to_rfc3339()}
    })
    .to_string()
}

pub fn task_end_frame(status: &str, secs: u32) -> String {
    json!({
        "type": "task_end",
        "payload": {"status": status, "timestamp": at(secs).to_rfc3339()}
    })
    .to_string()
}

pub fn fast_config() -> SessionConfig {
    SessionConfig {
        poll_interval: Duration::from_secs(2),
        initial_backoff: Duration::from_millis(500),
        max_backoff: Duration::from_secs(10),
        ..SessionConfig::default()
    }
}

/// Serves `current` on every fetch. Queued snapshots replace `current`
/// one per fetch; `fail_next` fetches fail first.
pub struct MockApi {
    current: Mutex<TaskSnapshot>,
    queued: Mutex<VecDeque<TaskSnapshot>>,
    fail_next: AtomicU32,
    calls: AtomicUsize,
    fetch_delay: Mutex<Option<Duration>>,
}

impl MockApi {
    pub fn new(snapshot: TaskSnapshot) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(snapshot),
            queued: Mutex::new(VecDeque::new()),
            fail_next: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
            fetch_delay: Mutex::new(None),
        })
    }

    pub fn then(&self, snapshot: TaskSnapshot) {
        self.queued.lock().unwrap().push_back(snapshot);
    }

    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskApi for MockApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_task(&self, task_id: &str) -> anyhow::Result<TaskSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("[timeout] fetch {task_id} timed out");
        }
        let mut current = self.current.lock().unwrap();
        if let Some(next) = self.queued.lock().unwrap().pop_front() {
            *current = next;
        }
        Ok(current.clone())
    }

    async fn regenerate_plan(&self, _task_id: &str) -> anyhow::Result<Option<String>> {
        let mut current = self.current.lock().unwrap();
        let plan = Plan {
            steps: vec![
                Step::new(1, "fetch", vec![]),
                Step::new(2, "summarise", vec![1]),
            ],
            summary: Some("fetch, summarise".into()),
            version: Some("2".into()),
        };
        current.plan = Some(plan);
        current.updated_at = current.updated_at.map(|t| t + chrono::Duration::seconds(30));
        Ok(Some("2".into()))
    }

    async fn list_tools(&self) -> anyhow::Result<ToolCatalog> {
        Ok(ToolCatalog::default())
    }
}

/// One scripted frame list per connection. A connection marked `hold`
/// stays open after its frames; otherwise it closes. Connecting past the
/// end of the script fails.
pub struct ScriptedConnector {
    script: Mutex<VecDeque<(Vec<String>, bool)>>,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            connects: AtomicUsize::new(0),
        })
    }

    pub fn closing(self: &Arc<Self>, frames: Vec<String>) -> Arc<Self> {
        self.script.lock().unwrap().push_back((frames, false));
        Arc::clone(self)
    }

    pub fn held(self: &Arc<Self>, frames: Vec<String>) -> Arc<Self> {
        self.script.lock().unwrap().push_back((frames, true));
        Arc::clone(self)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventConnector for ScriptedConnector {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn connect(&self, _task_id: &str) -> anyhow::Result<FrameStream> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let Some((frames, hold)) = next else {
            anyhow::bail!("connection refused");
        };
        let frames = stream::iter(frames.into_iter().map(Ok));
        if hold {
            Ok(frames.chain(stream::pending()).boxed())
        } else {
            Ok(frames.boxed())
        }
    }
}

/// Bounded wait in virtual time; panics instead of hanging.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(120), fut)
        .await
        .expect("condition not reached in time")
}
