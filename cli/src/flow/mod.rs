pub mod plain;
pub mod tui;
