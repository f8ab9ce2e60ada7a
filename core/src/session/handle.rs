use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::runner::ReconcileLoop;
use super::types::{SessionConfig, SourceHealth};
use crate::error::WatchError;
use crate::poll::{PollCommand, PollSource};
use crate::source::TaskApi;
use crate::state::{apply, ReconcileEvent, TaskView};
use crate::stream::{ConnectionState, EventConnector, StreamSource};

/// Starts the sources and the reconcile loop for one task.
pub struct WatchSession;

impl WatchSession {
    /// Fetch the task once (so a bad id fails fast), seed the view with that
    /// snapshot and start polling, streaming and reconciling.
    pub async fn open(
        task_id: impl Into<String>,
        api: Arc<dyn TaskApi>,
        connector: Option<Arc<dyn EventConnector>>,
        config: SessionConfig,
    ) -> Result<WatchHandle, WatchError> {
        let task_id = task_id.into();
        let first = api
            .fetch_task(&task_id)
            .await
            .map_err(WatchError::InitialFetch)?;
        let mut view = TaskView::new(task_id.clone());
        apply(&mut view, ReconcileEvent::Snapshot(Box::new(first)));

        tracing::info!(
            target: "taskwatch.session",
            stage = "session.open",
            task_id = %task_id,
            status = %view.status(),
            steps = view.graph().len(),
            stream = connector.is_some() && config.stream_enabled
        );
        Ok(Self::start_with_view(view, api, connector, config))
    }

    /// Start without the initial fetch; the view fills in from the sources.
    pub fn start(
        task_id: impl Into<String>,
        api: Arc<dyn TaskApi>,
        connector: Option<Arc<dyn EventConnector>>,
        config: SessionConfig,
    ) -> WatchHandle {
        Self::start_with_view(TaskView::new(task_id), api, connector, config)
    }

    fn start_with_view(
        view: TaskView,
        api: Arc<dyn TaskApi>,
        connector: Option<Arc<dyn EventConnector>>,
        config: SessionConfig,
    ) -> WatchHandle {
        let task_id = view.task_id().to_string();
        let epoch = Arc::new(AtomicU64::new(1));
        let current = epoch.load(Ordering::Acquire);
        let already_finished = view.is_terminal();

        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (view_tx, view_rx) = watch::channel(view);
        let (health_tx, health_rx) = watch::channel(SourceHealth::default());
        let (connection_tx, connection_rx) = watch::channel(ConnectionState::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (poll_tx, poll_rx) = mpsc::channel(4);

        let mut tasks = Vec::new();

        if already_finished {
            health_tx.send_modify(|h| h.poll_stopped = true);
        } else {
            let poll = PollSource::new(
                task_id.clone(),
                Arc::clone(&api),
                config.poll_interval,
                current,
                events_tx.clone(),
                poll_rx,
                shutdown_rx.clone(),
            );
            tasks.push(tokio::spawn(async move {
                poll.run().await;
            }));
        }

        if let Some(connector) = connector.filter(|_| config.stream_enabled) {
            let stream = StreamSource::new(
                task_id.clone(),
                connector,
                config.backoff(),
                current,
                events_tx.clone(),
                connection_tx,
                shutdown_rx.clone(),
            );
            tasks.push(tokio::spawn(async move {
                stream.run().await;
            }));
        }
        drop(events_tx);

        let reconcile = ReconcileLoop {
            events: events_rx,
            epoch: Arc::clone(&epoch),
            view_tx,
            health_tx,
            shutdown: shutdown_rx,
        };
        tasks.push(tokio::spawn(reconcile.run()));

        WatchHandle {
            task_id,
            api,
            epoch,
            view_rx,
            health_rx,
            connection_rx,
            poll_tx,
            shutdown_tx,
            tasks,
        }
    }
}

/// Control surface of a running watch session.
///
/// Dropping the handle stops the session; [`WatchHandle::stop`] also waits
/// for the background tasks to finish.
pub struct WatchHandle {
    task_id: String,
    api: Arc<dyn TaskApi>,
    epoch: Arc<AtomicU64>,
    view_rx: watch::Receiver<TaskView>,
    health_rx: watch::Receiver<SourceHealth>,
    connection_rx: watch::Receiver<ConnectionState>,
    poll_tx: mpsc::Sender<PollCommand>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn view(&self) -> watch::Receiver<TaskView> {
        self.view_rx.clone()
    }

    pub fn health(&self) -> watch::Receiver<SourceHealth> {
        self.health_rx.clone()
    }

    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection_rx.clone()
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Ask the poll source to fetch now. A no-op once polling has ended.
    pub fn refresh(&self) -> Result<(), WatchError> {
        if self.is_stopped() {
            return Err(WatchError::Stopped);
        }
        match self.poll_tx.try_send(PollCommand::RefreshNow) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    target: "taskwatch.session",
                    stage = "session.refresh.ignored",
                    task_id = %self.task_id
                );
                Ok(())
            }
        }
    }

    /// Regenerate the plan, then refresh so the new plan shows up even when
    /// the stream misses `plan_generated`.
    pub async fn regenerate_plan(&self) -> Result<Option<String>, WatchError> {
        if self.is_stopped() {
            return Err(WatchError::Stopped);
        }
        tracing::info!(
            target: "taskwatch.session",
            stage = "session.regenerate.in",
            task_id = %self.task_id,
            api = self.api.name()
        );
        let version = self
            .api
            .regenerate_plan(&self.task_id)
            .await
            .map_err(WatchError::Regenerate)?;
        tracing::info!(
            target: "taskwatch.session",
            stage = "session.regenerate.out",
            task_id = %self.task_id,
            plan_version = version.as_deref().unwrap_or("-")
        );
        self.refresh()?;
        Ok(version)
    }

    /// Stop all sources. Results still in flight carry the old epoch and
    /// are discarded by the reconcile loop.
    pub async fn stop(mut self) {
        self.signal_stop();
        let tasks = std::mem::take(&mut self.tasks);
        for result in futures::future::join_all(tasks).await {
            if let Err(err) = result {
                tracing::warn!(target: "taskwatch.session", stage = "session.join", error = %err);
            }
        }
        tracing::info!(target: "taskwatch.session", stage = "session.stopped", task_id = %self.task_id);
    }

    fn signal_stop(&self) {
        if self.is_stopped() {
            return;
        }
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.shutdown_tx.send_replace(true);
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}
