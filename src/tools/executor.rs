//! Command Executor
//!
//! This module runs a validated command line as a child process.
//! It implements shell-word tokenization, timeout handling, output capture,
//! and maps every failure to an [`ExecutionError`].

use super::timeout::{Elapsed, ExecutionTimeout};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

/// Maximum captured output in bytes (1MB)
pub const DEFAULT_MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Read buffer size for draining child pipes
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Result of a completed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured stdout followed by captured stderr
    pub output: String,

    /// Whether output was cut at the configured limit
    pub truncated: bool,
}

/// Failures that prevent a command from producing output
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("malformed command: {0}")]
    Tokenize(#[from] shell_words::ParseError),

    #[error("empty command")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' timed out after {} seconds", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },
}

impl ExecutionError {
    /// Whether this error is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionError::Timeout { .. })
    }
}

/// Configuration for command execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Deadline for each command (default: 8 seconds)
    pub timeout: ExecutionTimeout,

    /// Maximum captured output in bytes (default: 1MB)
    pub max_output_size: usize,

    /// Working directory for the child (default: inherited)
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: ExecutionTimeout::default(),
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
            working_dir: None,
        }
    }
}

impl ExecutorConfig {
    /// Set the per-command deadline
    pub fn with_timeout(mut self, timeout: impl Into<ExecutionTimeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Set the output limit
    pub fn with_max_output_size(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Executor for allowlisted commands
///
/// # Security
///
/// 1. The command line is split with POSIX shell-word rules and spawned
///    directly; no shell ever interprets `;`, `|`, `&&`, backticks or
///    redirections
/// 2. stdin is attached to null
/// 3. The child is killed when the deadline expires
/// 4. Captured output is bounded
///
/// The executor does not validate; callers pass commands that already
/// received an allowed verdict.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    config: ExecutorConfig,
}

impl CommandExecutor {
    /// Create an executor with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor with custom configuration
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the config
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a command line with the configured deadline
    pub async fn execute(&self, raw: &str) -> Result<ExecutionResult, ExecutionError> {
        self.execute_with_timeout(raw, self.config.timeout).await
    }

    /// Run a command line with an explicit deadline
    ///
    /// # Example
    ///
    /// ```no_run
    /// use safeterm::tools::{CommandExecutor, ExecutionTimeout};
    ///
    /// # async fn demo() -> Result<(), safeterm::tools::ExecutionError> {
    /// let executor = CommandExecutor::new();
    /// let result = executor
    ///     .execute_with_timeout("echo hello", ExecutionTimeout::from_secs(8))
    ///     .await?;
    /// assert_eq!(result.output, "hello\n");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute_with_timeout(
        &self,
        raw: &str,
        timeout: ExecutionTimeout,
    ) -> Result<ExecutionResult, ExecutionError> {
        let start = Instant::now();

        let argv = shell_words::split(raw)?;
        let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyCommand)?;

        info!(program = %program, args = args.len(), "Executing command");

        let mut process = TokioCommand::new(program);
        process
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.config.working_dir {
            process.current_dir(dir);
        }

        let mut child = process.spawn().map_err(|source| ExecutionError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.config.max_output_size;

        let outcome = timeout
            .run(async {
                tokio::try_join!(
                    read_capped(stdout, limit),
                    read_capped(stderr, limit),
                    child.wait(),
                )
            })
            .await;

        let (stdout, stderr, status) = match outcome {
            Ok(Ok(collected)) => collected,
            Ok(Err(source)) => {
                return Err(ExecutionError::Io {
                    program: program.clone(),
                    source,
                })
            }
            Err(Elapsed(deadline)) => {
                warn!(program = %program, timeout = ?deadline, "Command timed out, killing child");
                if let Err(e) = child.kill().await {
                    warn!(program = %program, "Failed to kill timed out child: {}", e);
                }
                return Err(ExecutionError::Timeout {
                    command: raw.to_string(),
                    timeout: deadline,
                });
            }
        };

        let result = combine_output(stdout, stderr, limit);

        debug!(
            program = %program,
            exit_code = ?status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            bytes = result.output.len(),
            truncated = result.truncated,
            "Command finished"
        );

        Ok(result)
    }
}

/// Bytes read from one pipe, bounded by a limit
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Drain a pipe to EOF, keeping at most `limit` bytes
///
/// The pipe is read to the end even past the limit so a chatty child does
/// not block on a full pipe.
async fn read_capped<R>(reader: Option<R>, limit: usize) -> std::io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Captured::default();
    let Some(mut reader) = reader else {
        return Ok(captured);
    };

    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(captured.bytes.len());
        if n > room {
            captured.truncated = true;
        }
        captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
    }

    Ok(captured)
}

/// Concatenate stdout then stderr, stdout taking priority under the limit
fn combine_output(stdout: Captured, stderr: Captured, limit: usize) -> ExecutionResult {
    let mut bytes = stdout.bytes;
    let mut truncated = stdout.truncated || stderr.truncated;

    let room = limit.saturating_sub(bytes.len());
    if stderr.bytes.len() > room {
        truncated = true;
    }
    bytes.extend_from_slice(&stderr.bytes[..stderr.bytes.len().min(room)]);

    ExecutionResult {
        output: String::from_utf8_lossy(&bytes).into_owned(),
        truncated,
    }
}
