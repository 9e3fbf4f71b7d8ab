//! Command Gate Subsystem
//!
//! This module decides whether a user-supplied command line may run and, if
//! so, runs it under a deadline.
//!
//! # Security Features
//!
//! - **Blocklist**: forbidden substrings anywhere in the command reject it
//! - **Allowlist**: the command must start with a known read-only utility
//! - **List Invocation**: commands are spawned from an argument vector, never through a shell
//! - **Timeout Enforcement**: children are killed when the deadline expires
//! - **Bounded Output**: captured output is capped
//!
//! The policy is literal text matching and nothing more. It is not a sandbox.
//!
//! # Architecture
//!
//! - `validator.rs`: blocklist/allowlist classification
//! - `executor.rs`: subprocess execution with output capture
//! - `timeout.rs`: deadline handling
//!
//! # Example
//!
//! ```no_run
//! use safeterm::tools::{CommandExecutor, CommandValidator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let validator = CommandValidator::default();
//!     let executor = CommandExecutor::new();
//!
//!     let command = "uname -a";
//!     if validator.validate(command).is_allowed() {
//!         let result = executor.execute(command).await?;
//!         println!("{}", result.output);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod executor;
mod timeout;
mod validator;

pub use executor::{
    CommandExecutor, ExecutionError, ExecutionResult, ExecutorConfig, DEFAULT_MAX_OUTPUT_SIZE,
};
pub use timeout::{Elapsed, ExecutionTimeout, DEFAULT_TIMEOUT_SECS};
pub use validator::{CommandValidator, Verdict, DEFAULT_ALLOWLIST, DEFAULT_BLOCKLIST};
