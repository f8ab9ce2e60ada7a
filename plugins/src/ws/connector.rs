use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use taskwatch_core::api::{stream_path, EventConnector, FrameStream};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;

/// tokio-tungstenite [`EventConnector`] for `{ws_base}/mandas/v1/tasks/{id}/stream`.
///
/// Only text frames are yielded. Pings are answered by tungstenite while
/// the stream is read; a close frame ends the stream.
#[derive(Clone)]
pub struct WsConnector {
    base: String,
    token: Option<String>,
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(ws_base: &str, token: Option<String>, connect_timeout_ms: u64) -> Self {
        Self {
            base: ws_base.trim().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            connect_timeout: Duration::from_millis(connect_timeout_ms.max(1)),
        }
    }

    pub fn url(&self, task_id: &str) -> String {
        format!("{}{}", self.base, stream_path(task_id))
    }
}

#[async_trait]
impl EventConnector for WsConnector {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn connect(&self, task_id: &str) -> anyhow::Result<FrameStream> {
        let url = self.url(task_id);
        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }

        tracing::debug!(target: "taskwatch.ws", stage = "ws.connect.in", url = %url);
        let (ws, response) = tokio::time::timeout(self.connect_timeout, connect_async(request))
            .await
            .map_err(|_| anyhow::anyhow!("[timeout] websocket connect to {url} timed out"))??;
        tracing::debug!(
            target: "taskwatch.ws",
            stage = "ws.connect.out",
            status = response.status().as_u16()
        );

        let frames = ws.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(target: "taskwatch.ws", stage = "ws.close", frame = ?frame);
                    None
                }
                Ok(_) => None,
                Err(err) => Some(Err(anyhow::Error::new(err))),
            }
        });
        Ok(frames.boxed())
    }
}
