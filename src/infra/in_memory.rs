use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::ports::{DiscoveryCache, RefreshLog, SnapshotStore, StarredStore, UserEventStore};
use crate::error::Result;
use crate::types::{EventRecord, SnapshotEntry};

#[derive(Debug, Default)]
struct State {
    hint: Option<u32>,
    snapshot: Option<Vec<SnapshotEntry>>,
    last_refresh: Option<DateTime<Utc>>,
    starred: BTreeSet<String>,
    user_events: Vec<EventRecord>,
    hint_writes: usize,
    snapshot_writes: usize,
}

/// In-memory state store for development/testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hint(hint: u32) -> Self {
        let store = Self::new();
        store.lock().hint = Some(hint);
        store
    }

    pub fn with_snapshot(entries: Vec<SnapshotEntry>) -> Self {
        let store = Self::new();
        store.lock().snapshot = Some(entries);
        store
    }

    pub fn hint(&self) -> Option<u32> {
        self.lock().hint
    }

    /// Number of `save_hint` calls observed.
    pub fn hint_writes(&self) -> usize {
        self.lock().hint_writes
    }

    /// Number of `save_snapshot` calls observed.
    pub fn snapshot_writes(&self) -> usize {
        self.lock().snapshot_writes
    }

    pub fn snapshot(&self) -> Option<Vec<SnapshotEntry>> {
        self.lock().snapshot.clone()
    }

    pub fn set_last_refreshed(&self, at: DateTime<Utc>) {
        self.lock().last_refresh = Some(at);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DiscoveryCache for InMemoryStateStore {
    async fn load_hint(&self) -> Result<Option<u32>> {
        Ok(self.lock().hint)
    }

    async fn save_hint(&self, last_page: u32) -> Result<()> {
        let mut state = self.lock();
        state.hint = Some(last_page);
        state.hint_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStateStore {
    async fn load_snapshot(&self) -> Result<Option<Vec<SnapshotEntry>>> {
        Ok(self.lock().snapshot.clone())
    }

    async fn save_snapshot(&self, entries: &[SnapshotEntry]) -> Result<()> {
        let mut state = self.lock();
        state.snapshot = Some(entries.to_vec());
        state.snapshot_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl RefreshLog for InMemoryStateStore {
    async fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock().last_refresh)
    }

    async fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        self.lock().last_refresh = Some(at);
        Ok(())
    }
}

#[async_trait]
impl StarredStore for InMemoryStateStore {
    async fn starred_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self.lock().starred.clone())
    }

    async fn set_starred(&self, unique_id: &str, starred: bool) -> Result<()> {
        let mut state = self.lock();
        if starred {
            state.starred.insert(unique_id.to_string());
        } else {
            state.starred.remove(unique_id);
        }
        Ok(())
    }
}

#[async_trait]
impl UserEventStore for InMemoryStateStore {
    async fn user_events(&self) -> Result<Vec<EventRecord>> {
        Ok(self.lock().user_events.clone())
    }

    async fn save_user_events(&self, events: &[EventRecord]) -> Result<()> {
        self.lock().user_events = events.to_vec();
        Ok(())
    }
}
