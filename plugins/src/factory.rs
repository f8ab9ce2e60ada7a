use std::sync::Arc;

use anyhow::Result;

use taskwatch_core::api::{AppConfig, EventConnector, TaskApi};

use crate::http::HttpTaskClient;
use crate::ws::WsConnector;

pub fn build_task_api(cfg: &AppConfig) -> Result<Arc<dyn TaskApi>> {
    let client = HttpTaskClient::new(
        &cfg.api.base_url,
        cfg.api.token().map(str::to_string),
        cfg.api.timeout_ms,
    )?;
    Ok(Arc::new(client))
}

/// `None` when the stream is disabled; the session then runs on polling
/// alone.
pub fn build_connector(cfg: &AppConfig) -> Option<Arc<dyn EventConnector>> {
    if !cfg.stream.enabled {
        return None;
    }
    Some(Arc::new(WsConnector::new(
        &cfg.api.resolved_ws_url(),
        cfg.api.token().map(str::to_string),
        cfg.api.timeout_ms,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_follows_stream_switch() {
        let mut cfg = AppConfig::default();
        assert!(build_connector(&cfg).is_some());
        cfg.stream.enabled = false;
        assert!(build_connector(&cfg).is_none());
    }

    #[test]
    fn test_task_api_builds_from_defaults() {
        let api = build_task_api(&AppConfig::default()).unwrap();
        assert_eq!(api.name(), "http");
    }
}
