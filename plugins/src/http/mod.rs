//! reqwest client for the task REST API.

mod client;
mod error;

pub use client::HttpTaskClient;
pub use error::{TaskHttpError, TaskHttpErrorKind};
