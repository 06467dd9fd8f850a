//! Chat transcript persistence.
//!
//! The transcript is saved as JSON in the cache directory so a restarted
//! client picks up the conversation where it left off. Only the newest
//! messages are kept on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ChatMessage;

/// Transcript file name in the cache directory
const HISTORY_FILE: &str = "history.json";

/// Upper bound on persisted transcript length; older messages are dropped.
const MAX_HISTORY_MESSAGES: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredHistory {
    saved_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

pub struct HistoryStore {
    cache_dir: PathBuf,
}

impl HistoryStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {:?}", cache_dir))?;
        Ok(Self { cache_dir })
    }

    /// Load the persisted transcript. An absent file is an empty transcript.
    pub fn load(&self) -> Result<Vec<ChatMessage>> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents =
            std::fs::read_to_string(&path).context("Failed to read history file")?;
        let stored: StoredHistory =
            serde_json::from_str(&contents).context("Failed to parse history file")?;

        debug!(count = stored.messages.len(), "Transcript loaded");
        Ok(stored.messages)
    }

    /// Persist the transcript, keeping only the newest messages.
    pub fn save(&self, messages: &[ChatMessage]) -> Result<()> {
        let start = messages.len().saturating_sub(MAX_HISTORY_MESSAGES);
        let stored = StoredHistory {
            saved_at: Utc::now(),
            messages: messages[start..].to_vec(),
        };

        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(self.history_path(), contents).context("Failed to write history file")?;
        Ok(())
    }

    /// Delete the persisted transcript. Idempotent.
    pub fn clear(&self) -> Result<()> {
        let path = self.history_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove history file")?;
        }
        Ok(())
    }

    fn history_path(&self) -> PathBuf {
        self.cache_dir.join(HISTORY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::{ChatMessage, Sender};

    #[test]
    fn test_history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf()).unwrap();

        let messages = vec![
            ChatMessage::bot("Hello!"),
            ChatMessage::user("How do I find customers?"),
        ];
        store.save(&messages).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, messages);
        assert_eq!(loaded[1].sender, Sender::User);
    }

    #[test]
    fn test_history_empty_when_never_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf()).unwrap();

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf()).unwrap();

        let messages: Vec<ChatMessage> = (0..MAX_HISTORY_MESSAGES + 25)
            .map(|i| ChatMessage::user(format!("question {}", i)))
            .collect();
        store.save(&messages).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), MAX_HISTORY_MESSAGES);
        // Newest messages survive, oldest are dropped
        assert_eq!(loaded.last(), messages.last());
        assert_eq!(loaded[0].message, "question 25");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf()).unwrap();

        store.save(&[ChatMessage::bot("Hello!")]).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());

        // Clearing again is fine
        store.clear().unwrap();
    }
}
