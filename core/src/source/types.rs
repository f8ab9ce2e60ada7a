use crate::state::ReconcileEvent;

/// Which source produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Poll,
    Stream,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Stream => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceSignal {
    /// Input for the reconciler.
    Event(ReconcileEvent),
    /// A poll request failed; the poll loop keeps running.
    PollFailed { consecutive: u32, error: String },
    /// The poll loop saw a terminal snapshot and will not fetch again.
    PollStopped,
}

/// Everything the sources send to the reconcile loop, stamped with the
/// session epoch current when the source was started.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub epoch: u64,
    pub source: SourceKind,
    pub signal: SourceSignal,
}

impl SourceEvent {
    pub fn event(epoch: u64, source: SourceKind, event: ReconcileEvent) -> Self {
        Self {
            epoch,
            source,
            signal: SourceSignal::Event(event),
        }
    }
}
