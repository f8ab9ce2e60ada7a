//! The reconcile loop: sole consumer of source events and sole writer of the
//! published [`TaskView`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::types::SourceHealth;
use crate::source::{raised, SourceEvent, SourceKind, SourceSignal};
use crate::state::{apply, TaskView};

pub(crate) struct ReconcileLoop {
    pub events: mpsc::Receiver<SourceEvent>,
    pub epoch: Arc<AtomicU64>,
    pub view_tx: watch::Sender<TaskView>,
    pub health_tx: watch::Sender<SourceHealth>,
    pub shutdown: watch::Receiver<bool>,
}

impl ReconcileLoop {
    pub async fn run(mut self) {
        loop {
            let event = tokio::select! {
                _ = raised(&mut self.shutdown) => break,
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle(event);
        }
        tracing::debug!(target: "taskwatch.session", stage = "session.reconcile.exit");
    }

    fn handle(&mut self, event: SourceEvent) {
        let current = self.epoch.load(Ordering::Acquire);
        if event.epoch != current {
            tracing::debug!(
                target: "taskwatch.session",
                stage = "session.stale_epoch",
                event_epoch = event.epoch,
                current
            );
            self.health_tx.send_modify(|h| h.stale_events += 1);
            return;
        }

        match event.signal {
            SourceSignal::Event(ev) => {
                self.view_tx
                    .send_if_modified(|view| apply(view, ev).is_changed());
                if event.source == SourceKind::Poll {
                    self.health_tx.send_if_modified(|h| {
                        let was_failing = h.poll_failures > 0;
                        h.poll_failures = 0;
                        was_failing
                    });
                }
            }
            SourceSignal::PollFailed { consecutive, error } => {
                self.health_tx.send_modify(|h| {
                    h.poll_failures = consecutive;
                    h.last_poll_error = Some(error);
                });
            }
            SourceSignal::PollStopped => {
                self.health_tx.send_modify(|h| h.poll_stopped = true);
            }
        }
    }
}
