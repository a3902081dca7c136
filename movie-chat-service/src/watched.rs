//! Per-user "already watched" bookkeeping. The chat steps only need the id
//! set; the history endpoints expose the full timestamped records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WatchedStoreError {
    #[error("watched store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watched store data malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One watched-movie entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRecord {
    pub movie_id: i64,
    pub watched_at: DateTime<Utc>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl WatchRecord {
    pub fn now(movie_id: i64, rating: Option<f64>) -> Self {
        Self {
            movie_id,
            watched_at: Utc::now(),
            rating,
        }
    }
}

/// Watched-history storage, keyed by user id.
#[async_trait]
pub trait WatchedStore: Send + Sync {
    /// The movie ids this user has already seen. Unknown users have seen
    /// nothing.
    async fn watched_ids(&self, user_id: u64) -> HashSet<i64>;

    async fn add(&self, user_id: u64, record: WatchRecord) -> Result<(), WatchedStoreError>;

    /// Full history for a user, most recent first.
    async fn history(&self, user_id: u64) -> Vec<WatchRecord>;
}

fn sorted_desc(mut records: Vec<WatchRecord>) -> Vec<WatchRecord> {
    records.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
    records
}

/// In-memory implementation of [`WatchedStore`].
#[derive(Default)]
pub struct InMemoryWatchedStore {
    entries: DashMap<u64, Vec<WatchRecord>>,
}

impl InMemoryWatchedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatchedStore for InMemoryWatchedStore {
    async fn watched_ids(&self, user_id: u64) -> HashSet<i64> {
        self.entries
            .get(&user_id)
            .map(|records| records.iter().map(|r| r.movie_id).collect())
            .unwrap_or_default()
    }

    async fn add(&self, user_id: u64, record: WatchRecord) -> Result<(), WatchedStoreError> {
        self.entries.entry(user_id).or_default().push(record);
        Ok(())
    }

    async fn history(&self, user_id: u64) -> Vec<WatchRecord> {
        sorted_desc(
            self.entries
                .get(&user_id)
                .map(|records| records.clone())
                .unwrap_or_default(),
        )
    }
}

/// JSON-file-backed implementation: durable local storage, rewritten on every
/// mutation. Good enough for a per-user set of a handful of ids.
pub struct JsonFileWatchedStore {
    path: PathBuf,
    entries: DashMap<u64, Vec<WatchRecord>>,
}

impl JsonFileWatchedStore {
    /// Open (or create) the backing file and load its contents.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WatchedStoreError> {
        let path = path.into();
        let entries = DashMap::new();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if !raw.trim().is_empty() {
                let loaded: HashMap<u64, Vec<WatchRecord>> = serde_json::from_str(&raw)?;
                for (user_id, records) in loaded {
                    entries.insert(user_id, records);
                }
            }
        }
        info!(path = %path.display(), users = entries.len(), "opened watched store");
        Ok(Self { path, entries })
    }

    fn persist(&self) -> Result<(), WatchedStoreError> {
        let snapshot: HashMap<u64, Vec<WatchRecord>> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        let raw = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[async_trait]
impl WatchedStore for JsonFileWatchedStore {
    async fn watched_ids(&self, user_id: u64) -> HashSet<i64> {
        self.entries
            .get(&user_id)
            .map(|records| records.iter().map(|r| r.movie_id).collect())
            .unwrap_or_default()
    }

    async fn add(&self, user_id: u64, record: WatchRecord) -> Result<(), WatchedStoreError> {
        self.entries.entry(user_id).or_default().push(record);
        self.persist()
    }

    async fn history(&self, user_id: u64) -> Vec<WatchRecord> {
        sorted_desc(
            self.entries
                .get(&user_id)
                .map(|records| records.clone())
                .unwrap_or_default(),
        )
    }
}
