use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

use crate::source::{raised, SourceEvent, SourceKind, SourceSignal, TaskApi};
use crate::state::ReconcileEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Fetch now instead of waiting for the next tick.
    RefreshNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// A terminal snapshot was emitted; no further request is made.
    Terminal,
    Shutdown,
    /// The reconcile loop is gone.
    Closed,
}

/// Fetches the full task snapshot on a fixed interval until the task
/// reaches a terminal status.
pub struct PollSource {
    task_id: String,
    api: Arc<dyn TaskApi>,
    interval: Duration,
    epoch: u64,
    events: mpsc::Sender<SourceEvent>,
    commands: mpsc::Receiver<PollCommand>,
    shutdown: watch::Receiver<bool>,
    failures: u32,
}

impl PollSource {
    pub fn new(
        task_id: impl Into<String>,
        api: Arc<dyn TaskApi>,
        interval: Duration,
        epoch: u64,
        events: mpsc::Sender<SourceEvent>,
        commands: mpsc::Receiver<PollCommand>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            api,
            interval: interval.max(Duration::from_millis(1)),
            epoch,
            events,
            commands,
            shutdown,
            failures: 0,
        }
    }

    pub async fn run(mut self) -> PollExit {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = raised(&mut self.shutdown) => return PollExit::Shutdown,
                _ = ticker.tick() => {}
                cmd = self.commands.recv(), if commands_open => match cmd {
                    Some(PollCommand::RefreshNow) => {
                        tracing::debug!(
                            target: "taskwatch.poll",
                            stage = "poll.refresh_now",
                            task_id = %self.task_id
                        );
                        ticker.reset();
                    }
                    None => {
                        commands_open = false;
                        continue;
                    }
                },
            }

            if let Err(exit) = self.poll_once().await {
                tracing::info!(
                    target: "taskwatch.poll",
                    stage = "poll.exit",
                    task_id = %self.task_id,
                    exit = ?exit
                );
                return exit;
            }
        }
    }

    /// `Err` carries the reason the loop must stop.
    async fn poll_once(&mut self) -> Result<(), PollExit> {
        let api = Arc::clone(&self.api);
        tracing::debug!(target: "taskwatch.poll", stage = "poll.fetch.in", task_id = %self.task_id);
        let fetched = tokio::select! {
            _ = raised(&mut self.shutdown) => return Err(PollExit::Shutdown),
            res = api.fetch_task(&self.task_id) => res,
        };

        match fetched {
            Ok(snapshot) => {
                if self.failures > 0 {
                    tracing::info!(
                        target: "taskwatch.poll",
                        stage = "poll.recovered",
                        task_id = %self.task_id,
                        after_failures = self.failures
                    );
                }
                self.failures = 0;
                let terminal = snapshot.status.is_terminal();
                tracing::debug!(
                    target: "taskwatch.poll",
                    stage = "poll.fetch.out",
                    status = %snapshot.status,
                    steps = snapshot.plan_steps().map_or(0, |s| s.len())
                );
                let event = ReconcileEvent::Snapshot(Box::new(snapshot));
                self.send(SourceSignal::Event(event)).await?;
                if terminal {
                    self.send(SourceSignal::PollStopped).await?;
                    return Err(PollExit::Terminal);
                }
                Ok(())
            }
            Err(err) => {
                self.failures += 1;
                let error = format!("{err:#}");
                tracing::warn!(
                    target: "taskwatch.poll",
                    stage = "poll.fetch.error",
                    task_id = %self.task_id,
                    api = self.api.name(),
                    consecutive = self.failures,
                    error = %error
                );
                self.send(SourceSignal::PollFailed {
                    consecutive: self.failures,
                    error,
                })
                .await
            }
        }
    }

    async fn send(&self, signal: SourceSignal) -> Result<(), PollExit> {
        let event = SourceEvent {
            epoch: self.epoch,
            source: SourceKind::Poll,
            signal,
        };
        self.events
            .send(event)
            .await
            .map_err(|_| PollExit::Closed)
    }
}
