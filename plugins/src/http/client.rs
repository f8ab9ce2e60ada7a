use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use taskwatch_core::api::{TaskApi, TaskSnapshot, ToolCatalog};

use super::error::{preview_body, TaskHttpError};

const API_PREFIX: &str = "/mandas/v1";

/// Read the body and decode it as `T`. Non-2xx responses become
/// [`TaskHttpError`]s carrying a body preview; an empty 2xx body decodes
/// from `null`.
async fn parse_json_response<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|err| TaskHttpError::from_reqwest(err, url.clone()))?;

    if !status.is_success() {
        let preview = preview_body(&body);
        return Err(TaskHttpError::status_error(status.as_u16(), url, preview).into());
    }

    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str::<T>(text).map_err(|err| {
        let preview = preview_body(&body);
        TaskHttpError::decode_error(status.as_u16(), url, err, preview).into()
    })
}

/// `plan_version` from a regenerate response; absent, empty or non-scalar
/// values yield `None`.
fn plan_version(v: &Value) -> Option<String> {
    match v.get("plan_version")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// reqwest-backed [`TaskApi`].
#[derive(Clone)]
pub struct HttpTaskClient {
    token: Option<String>,
    http: reqwest::Client,
    base: String,
    url_tools: String,
}

impl HttpTaskClient {
    pub fn new(base_url: &str, token: Option<String>, timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        let base = format!("{}{}", base_url.trim().trim_end_matches('/'), API_PREFIX);
        Ok(Self {
            token: token.filter(|t| !t.trim().is_empty()),
            http,
            url_tools: format!("{base}/tools"),
            base,
        })
    }

    fn task_url(&self, task_id: &str) -> String {
        format!("{}/tasks/{}", self.base, task_id)
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl TaskApi for HttpTaskClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_task(&self, task_id: &str) -> anyhow::Result<TaskSnapshot> {
        let url = self.task_url(task_id);
        tracing::debug!(target: "taskwatch.http", stage = "http.task.in", url = %url);
        let resp = self
            .auth(self.http.get(&url))
            .send()
            .await
            .map_err(|err| TaskHttpError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let snapshot: TaskSnapshot = parse_json_response(resp).await?;
        tracing::debug!(
            target: "taskwatch.http",
            stage = "http.task.out",
            status = %status,
            task_status = %snapshot.status
        );
        Ok(snapshot)
    }

    async fn regenerate_plan(&self, task_id: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/plan/regenerate", self.task_url(task_id));
        tracing::debug!(target: "taskwatch.http", stage = "http.regenerate.in", url = %url);
        let resp = self
            .auth(self.http.post(&url))
            .send()
            .await
            .map_err(|err| TaskHttpError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let v: Value = parse_json_response(resp).await?;
        let version = plan_version(&v);
        tracing::debug!(
            target: "taskwatch.http",
            stage = "http.regenerate.out",
            status = %status,
            plan_version = version.as_deref().unwrap_or("-")
        );
        Ok(version)
    }

    async fn list_tools(&self) -> anyhow::Result<ToolCatalog> {
        let url = &self.url_tools;
        tracing::debug!(target: "taskwatch.http", stage = "http.tools.in", url = %url);
        let resp = self
            .auth(self.http.get(url))
            .send()
            .await
            .map_err(|err| TaskHttpError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let v: Value = parse_json_response(resp).await?;
        let catalog = if v.is_null() {
            ToolCatalog::default()
        } else {
            serde_json::from_value::<ToolCatalog>(v).map_err(|err| {
                TaskHttpError::decode_error(status.as_u16(), url.clone(), err, String::new())
            })?
        };
        tracing::debug!(
            target: "taskwatch.http",
            stage = "http.tools.out",
            status = %status,
            tools = catalog.tools.len()
        );
        Ok(catalog)
    }
}
