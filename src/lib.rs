//! SafeTerm Library
//!
//! This library provides the core of the SafeTerm web terminal: the command
//! safety gate, the deadline-bounded executor, the shared command history,
//! and the HTTP surface that exposes them.

pub mod config;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod terminal;
pub mod tools;

pub use config::Config;
pub use history::{HistoryEntry, HistoryLog};
pub use terminal::Terminal;
