pub mod api;
pub mod config;
pub mod error;
pub mod graph;
pub mod logs;
pub mod model;
pub mod poll;
pub mod projection;
pub mod session;
pub mod source;
pub mod state;
pub mod stream;
