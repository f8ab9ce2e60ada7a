//! Periodic full-state polling.

mod source;

pub use source::{PollCommand, PollExit, PollSource, DEFAULT_POLL_INTERVAL};
