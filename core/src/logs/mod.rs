//! Append-only, id-idempotent log buffer with lazy filtered views.

mod buffer;
mod filter;

pub use buffer::LogBuffer;
pub use filter::{LogFilter, LogView, LogViewIter};
