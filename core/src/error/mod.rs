#[allow(clippy::module_inception)]
pub mod error;
pub mod plan;
pub mod stream;

pub use error::{CliError, WatchError};
pub use plan::PlanError;
pub use stream::{ConnectionError, DecodeError};
