use async_trait::async_trait;
use futures::stream::BoxStream;

/// Text frames of one open connection. The stream ends when the peer
/// closes; an `Err` item ends the connection as well.
pub type FrameStream = BoxStream<'static, anyhow::Result<String>>;

/// Opens the push event stream for a task.
///
/// Implementations filter out non-text frames and answer pings themselves.
#[async_trait]
pub trait EventConnector: Send + Sync {
    fn name(&self) -> &str;
    async fn connect(&self, task_id: &str) -> anyhow::Result<FrameStream>;
}
