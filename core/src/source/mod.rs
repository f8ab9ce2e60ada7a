//! Collaborator seams shared by the poll and stream sources.

mod traits;
mod types;

pub use traits::TaskApi;
pub use types::{SourceEvent, SourceKind, SourceSignal};

use tokio::sync::watch;

/// Resolves once `flag` turns true or its sender is gone.
pub(crate) async fn raised(flag: &mut watch::Receiver<bool>) {
    loop {
        if *flag.borrow_and_update() {
            return;
        }
        if flag.changed().await.is_err() {
            return;
        }
    }
}
