//! Chat history kept between `coda chat` runs. Last write wins.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use coda_common::{ChatMessage, HistoryCfg};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub at: DateTime<Utc>,
}

pub struct History {
    path: PathBuf,
    max: usize,
    entries: Vec<Entry>,
}

impl History {
    pub fn load(cfg: &HistoryCfg) -> Result<Self> {
        let path = PathBuf::from(&cfg.path);
        let entries = if path.exists() {
            let raw = coda_tools::fs::read_to_string(&cfg.path)?;
            match serde_json::from_str::<Vec<Entry>>(&raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "history unreadable, starting fresh");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            max: cfg.max_messages.max(1),
            entries,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    /// Appends and drops the oldest entries beyond the configured cap.
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(Entry {
            message,
            at: Utc::now(),
        });
        if self.entries.len() > self.max {
            let excess = self.entries.len() - self.max;
            self.entries.drain(..excess);
        }
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        coda_tools::fs::write_from_string(&self.path.to_string_lossy(), &json)
            .with_context(|| format!("save history to {}", self.path.display()))
    }

    /// Removes the history file. Returns false when there was nothing to remove.
    pub fn clear(cfg: &HistoryCfg) -> Result<bool> {
        let path = Path::new(&cfg.path);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
        Ok(true)
    }
}
