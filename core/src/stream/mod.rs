//! Push event stream: connection state machine, frame decoding and the
//! reconnecting source loop.

mod decode;
mod source;
mod traits;
mod types;

pub use decode::decode_message;
pub use source::{StreamExit, StreamSource};
pub use traits::{EventConnector, FrameStream};
pub use types::{Backoff, ConnectionPhase, ConnectionState};

/// Path of the event stream relative to the websocket base URL.
pub fn stream_path(task_id: &str) -> String {
    format!("/mandas/v1/tasks/{task_id}/stream")
}
