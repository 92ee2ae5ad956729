//! HTTP API: server, JSON response types and the live log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::{log_error, log_info, log_info_indent, log_success, log_warning, LogEntry, LogLevel};
pub use server::{router, start_server, AppState};
pub use types::*;
