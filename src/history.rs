//! Command History
//!
//! This module records every command submitted to the terminal, whether it
//! ran or was refused. The log only grows; readers see a window over its tail.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of entries exposed by the default tail view
pub const DEFAULT_VIEW_SIZE: usize = 40;

/// Label attached to refused commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryLabel {
    /// Command was rejected by the validator
    Blocked,
}

impl std::fmt::Display for EntryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryLabel::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// A single history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the command was submitted (local time)
    pub timestamp: DateTime<Local>,

    /// Set for refused commands
    pub label: Option<EntryLabel>,

    /// The command as submitted
    pub command: String,
}

impl HistoryEntry {
    /// Entry for a command that was executed
    pub fn executed(command: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            label: None,
            command: command.into(),
        }
    }

    /// Entry for a command that was refused
    pub fn blocked(command: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            label: Some(EntryLabel::Blocked),
            command: command.into(),
        }
    }

    /// Render as `HH:MM:SS  [BLOCKED: ]command`
    pub fn render(&self) -> String {
        let time = self.timestamp.format("%H:%M:%S");
        match self.label {
            Some(label) => format!("{}  {}: {}", time, label, self.command),
            None => format!("{}  {}", time, self.command),
        }
    }
}

impl std::fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Append-only command log shared by all requests
///
/// Cloning shares the underlying log. Appends and reads are serialized by a
/// single lock, so an entry is either fully visible or not at all.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl HistoryLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning its index
    pub async fn append(&self, entry: HistoryEntry) -> usize {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        entries.len() - 1
    }

    /// The last `n` entries, oldest first
    pub async fn tail(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// The last `n` entries rendered as text, oldest first
    pub async fn tail_view(&self, n: usize) -> Vec<String> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(n);
        entries[start..].iter().map(HistoryEntry::render).collect()
    }

    /// Total number of entries ever appended
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been appended yet
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
