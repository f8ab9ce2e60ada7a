//! Watch session: one task, two sources, one reconcile loop.
//!
//! ```text
//! PollSource ──┐
//!              ├─ mpsc<SourceEvent{epoch}> ─→ ReconcileLoop ─→ watch<TaskView>
//! StreamSource ┘                                           └─→ watch<SourceHealth>
//! StreamSource ───────────────────────────────────────────────→ watch<ConnectionState>
//! ```

mod handle;
mod runner;
mod types;

pub use handle::{WatchHandle, WatchSession};
pub use types::{SessionConfig, SourceHealth};
