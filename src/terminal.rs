//! Request Orchestration
//!
//! `Terminal` is the single entry point used by the HTTP layer and the CLI:
//! validate, execute if allowed, record in history, and turn every outcome
//! into output text.

use crate::history::{HistoryEntry, HistoryLog, DEFAULT_VIEW_SIZE};
use crate::metrics;
use crate::tools::{CommandExecutor, CommandValidator, Verdict};
use std::time::Instant;
use tracing::{info, warn};

/// Suffix appended when captured output hit the size limit
pub const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Validator, executor and history wired together
#[derive(Debug, Clone)]
pub struct Terminal {
    validator: CommandValidator,
    executor: CommandExecutor,
    history: HistoryLog,
    view_size: usize,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new(CommandValidator::default(), CommandExecutor::new())
    }
}

impl Terminal {
    /// Create a terminal with a fresh history
    pub fn new(validator: CommandValidator, executor: CommandExecutor) -> Self {
        Self {
            validator,
            executor,
            history: HistoryLog::new(),
            view_size: DEFAULT_VIEW_SIZE,
        }
    }

    /// Set how many entries the history view exposes
    pub fn with_view_size(mut self, view_size: usize) -> Self {
        self.view_size = view_size;
        self
    }

    /// Get the validator
    pub fn validator(&self) -> &CommandValidator {
        &self.validator
    }

    /// Get the shared history log
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Run one submitted command and return the text shown to the user
    ///
    /// Never fails: refusals, timeouts and spawn errors all become output.
    pub async fn run(&self, raw: &str) -> String {
        let command = raw.trim();
        let verdict = self.validator.validate(command);
        metrics::COMMANDS_TOTAL
            .with_label_values(&[verdict.kind()])
            .inc();

        let (output, entry) = match verdict {
            Verdict::Allowed => (self.execute(command).await, HistoryEntry::executed(command)),
            Verdict::Blocked(reason) | Verdict::NotWhitelisted(reason) => {
                warn!(command = %command, reason = %reason, "Command rejected");
                (format!("[ERROR] {}", reason), HistoryEntry::blocked(command))
            }
        };

        self.history.append(entry).await;
        metrics::HISTORY_ENTRIES.inc();

        output
    }

    /// Execute an allowed command and render the result
    async fn execute(&self, command: &str) -> String {
        let start = Instant::now();
        let result = self.executor.execute(command).await;
        metrics::COMMAND_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());

        match result {
            Ok(result) => {
                info!(
                    command = %command,
                    bytes = result.output.len(),
                    truncated = result.truncated,
                    "Command executed"
                );
                if result.truncated {
                    result.output + TRUNCATION_MARKER
                } else {
                    result.output
                }
            }
            Err(e) => {
                if e.is_timeout() {
                    metrics::COMMAND_TIMEOUTS_TOTAL.inc();
                } else {
                    metrics::COMMAND_SPAWN_FAILURES_TOTAL.inc();
                }
                warn!(command = %command, "Command failed: {}", e);
                format!("[Exception] {}", e)
            }
        }
    }

    /// Rendered history window, oldest first
    pub async fn history_view(&self) -> Vec<String> {
        self.history.tail_view(self.view_size).await
    }
}
