//! Most-recent-first list of started session configurations.
//!
//! Entries are unique by structural equality of their `config`; recording a
//! configuration that is already present moves it to the front instead of
//! adding a second copy, and the list never grows past [`HISTORY_LIMIT`].

use cadence_ipc::{HistoryItem, Mode};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::phase::PhaseList;

pub const HISTORY_LIMIT: usize = 5;

/// Snapshot of what a session was started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionConfig {
    Timer { duration_secs: u64 },
    Cycle { phases: PhaseList },
}

impl SessionConfig {
    pub fn mode(&self) -> Mode {
        match self {
            SessionConfig::Timer { .. } => Mode::Timer,
            SessionConfig::Cycle { .. } => Mode::Cycle,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        match self {
            SessionConfig::Timer { duration_secs } => {
                u32::try_from(duration_secs / 60).unwrap_or(u32::MAX)
            }
            SessionConfig::Cycle { phases } => phases.total_minutes(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            SessionConfig::Timer { .. } => "Timer".to_string(),
            SessionConfig::Cycle { phases } => phases.first().name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Milliseconds since the epoch, strictly increasing within a store.
    pub id: i64,
    pub mode: Mode,
    pub total_minutes: u32,
    pub label: String,
    pub config: SessionConfig,
}

impl HistoryEntry {
    pub fn item(&self) -> HistoryItem {
        HistoryItem {
            id: self.id,
            mode: self.mode,
            total_minutes: self.total_minutes,
            label: self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    last_id: i64,
}

impl HistoryStore {
    /// Restore persisted entries, dropping zero-length timers, duplicates and
    /// anything past the limit.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let mut kept: Vec<HistoryEntry> = Vec::with_capacity(HISTORY_LIMIT);
        for entry in entries {
            if kept.len() == HISTORY_LIMIT {
                break;
            }
            if let SessionConfig::Timer { duration_secs: 0 } = entry.config {
                continue;
            }
            if kept.iter().all(|k| k.config != entry.config) {
                kept.push(entry);
            }
        }
        let last_id = kept.iter().map(|e| e.id).max().unwrap_or(0);
        Self {
            entries: kept,
            last_id,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move-to-front insert with cap. `now_ms` is bumped if needed so ids
    /// stay strictly increasing.
    pub fn record(&mut self, config: SessionConfig, now_ms: i64) -> &HistoryEntry {
        let id = now_ms.max(self.last_id + 1);
        self.last_id = id;
        self.entries.retain(|e| e.config != config);
        self.entries.insert(
            0,
            HistoryEntry {
                id,
                mode: config.mode(),
                total_minutes: config.total_minutes(),
                label: config.label(),
                config,
            },
        );
        self.entries.truncate(HISTORY_LIMIT);
        &self.entries[0]
    }

    pub fn remove(&mut self, index: usize) -> Result<HistoryEntry> {
        self.check(index)?;
        Ok(self.entries.remove(index))
    }

    /// The stored configuration at `index`. Order is left untouched.
    pub fn replay(&self, index: usize) -> Result<SessionConfig> {
        self.check(index)?;
        Ok(self.entries[index].config.clone())
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(SessionError::OutOfRange {
                collection: "history",
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }
}
