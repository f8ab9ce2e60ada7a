use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};

use super::decode::decode_message;
use super::traits::EventConnector;
use super::types::{Backoff, ConnectionPhase, ConnectionState};
use crate::source::{raised, SourceEvent, SourceKind};

const FRAME_PREVIEW_LIMIT: usize = 200;

/// Why [`StreamSource::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamExit {
    /// The session asked to stop.
    Shutdown,
    /// The reconcile loop is gone.
    Closed,
}

/// Long-lived push subscription for one task.
///
/// Connects through the [`EventConnector`], decodes frames and forwards them
/// to the reconcile loop. Dropped connections are retried with exponential
/// backoff; missed events are not replayed. The subscription outlives
/// `task_end`: late logs and step updates still flow until shutdown.
pub struct StreamSource {
    task_id: String,
    connector: Arc<dyn EventConnector>,
    backoff: Backoff,
    epoch: u64,
    events: mpsc::Sender<SourceEvent>,
    state_tx: watch::Sender<ConnectionState>,
    state: ConnectionState,
    shutdown: watch::Receiver<bool>,
}

impl StreamSource {
    pub fn new(
        task_id: impl Into<String>,
        connector: Arc<dyn EventConnector>,
        backoff: Backoff,
        epoch: u64,
        events: mpsc::Sender<SourceEvent>,
        state_tx: watch::Sender<ConnectionState>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            connector,
            backoff,
            epoch,
            events,
            state_tx,
            state: ConnectionState::default(),
            shutdown,
        }
    }

    pub async fn run(mut self) -> StreamExit {
        let exit = self.session_loop().await;
        self.set_phase(ConnectionPhase::Disconnected);
        tracing::info!(
            target: "taskwatch.stream",
            stage = "stream.exit",
            task_id = %self.task_id,
            exit = ?exit
        );
        exit
    }

    async fn session_loop(&mut self) -> StreamExit {
        loop {
            self.set_phase(ConnectionPhase::Connecting);
            let connector = Arc::clone(&self.connector);
            let connect = tokio::select! {
                _ = raised(&mut self.shutdown) => return StreamExit::Shutdown,
                res = connector.connect(&self.task_id) => res,
            };

            match connect {
                Ok(mut frames) => {
                    self.set_phase(ConnectionPhase::Connected);
                    self.backoff.reset();
                    tracing::info!(
                        target: "taskwatch.stream",
                        stage = "stream.connected",
                        task_id = %self.task_id,
                        connector = self.connector.name()
                    );
                    loop {
                        let frame = tokio::select! {
                            _ = raised(&mut self.shutdown) => return StreamExit::Shutdown,
                            frame = frames.next() => frame,
                        };
                        match frame {
                            Some(Ok(text)) => {
                                if let Some(exit) = self.forward(&text).await {
                                    return exit;
                                }
                            }
                            Some(Err(err)) => {
                                self.state.last_error = Some(format!("{err:#}"));
                                break;
                            }
                            None => {
                                self.state.last_error = Some("closed by peer".to_string());
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    self.state.last_error = Some(format!("{err:#}"));
                }
            }

            self.set_phase(ConnectionPhase::Reconnecting);
            let delay = self.backoff.next_delay();
            tracing::warn!(
                target: "taskwatch.stream",
                stage = "stream.reconnect",
                task_id = %self.task_id,
                attempt = self.state.attempt,
                delay_ms = delay.as_millis() as u64,
                error = self.state.last_error.as_deref().unwrap_or_default()
            );
            tokio::select! {
                _ = raised(&mut self.shutdown) => return StreamExit::Shutdown,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Decode and forward one frame. Undecodable frames are dropped.
    async fn forward(&mut self, text: &str) -> Option<StreamExit> {
        let event = match decode_message(text, Utc::now()) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(
                    target: "taskwatch.stream",
                    stage = "stream.decode",
                    task_id = %self.task_id,
                    kind = err.as_str(),
                    error = %err,
                    frame = %preview(text)
                );
                return None;
            }
        };
        tracing::debug!(
            target: "taskwatch.stream",
            stage = "stream.event",
            kind = event.kind()
        );
        let sent = self
            .events
            .send(SourceEvent::event(self.epoch, SourceKind::Stream, event))
            .await;
        sent.is_err().then_some(StreamExit::Closed)
    }

    fn set_phase(&mut self, to: ConnectionPhase) {
        if let Err(err) = self.state.transition(to) {
            tracing::debug!(target: "taskwatch.stream", stage = "stream.phase", error = %err);
            return;
        }
        self.state_tx.send_replace(self.state.clone());
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(FRAME_PREVIEW_LIMIT).collect();
    if text.chars().count() > FRAME_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}
