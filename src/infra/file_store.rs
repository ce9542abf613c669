//! State directory persistence for the ports in `app::ports`.
//!
//! Layout:
//! - `last_page_hint`: decimal page index
//! - `snapshot.json`: JSON array of `{title, rawDateText, link}`
//! - `last_refresh`: RFC 3339 timestamp
//! - `starred.json`: JSON array of unique ids
//! - `user_events.json`: JSON array of hand-entered event records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::app::ports::{DiscoveryCache, RefreshLog, SnapshotStore, StarredStore, UserEventStore};
use crate::error::{Result, ScraperError};
use crate::types::{EventRecord, SnapshotEntry};

const HINT_FILE: &str = "last_page_hint";
const SNAPSHOT_FILE: &str = "snapshot.json";
const REFRESH_FILE: &str = "last_refresh";
const STARRED_FILE: &str = "starred.json";
const USER_EVENTS_FILE: &str = "user_events.json";

#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read(&self, name: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.dir.join(name)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename, so readers never see a torn file.
    async fn write(&self, name: &str, content: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &target).await?;
        debug!("Wrote {}", target.display());
        Ok(())
    }
}

#[async_trait]
impl DiscoveryCache for FileStateStore {
    async fn load_hint(&self) -> Result<Option<u32>> {
        match self.read(HINT_FILE).await? {
            Some(content) => content.trim().parse().map(Some).map_err(|_| {
                ScraperError::Store(format!("unreadable last page hint: '{}'", content.trim()))
            }),
            None => Ok(None),
        }
    }

    async fn save_hint(&self, last_page: u32) -> Result<()> {
        self.write(HINT_FILE, last_page.to_string().as_bytes()).await
    }
}

#[async_trait]
impl SnapshotStore for FileStateStore {
    async fn load_snapshot(&self) -> Result<Option<Vec<SnapshotEntry>>> {
        match self.read(SNAPSHOT_FILE).await? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    async fn save_snapshot(&self, entries: &[SnapshotEntry]) -> Result<()> {
        let json = serde_json::to_vec(entries)?;
        self.write(SNAPSHOT_FILE, &json).await
    }
}

#[async_trait]
impl RefreshLog for FileStateStore {
    async fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>> {
        match self.read(REFRESH_FILE).await? {
            Some(content) => DateTime::parse_from_rfc3339(content.trim())
                .map(|at| Some(at.with_timezone(&Utc)))
                .map_err(|e| ScraperError::Store(format!("unreadable refresh time: {}", e))),
            None => Ok(None),
        }
    }

    async fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        self.write(REFRESH_FILE, at.to_rfc3339().as_bytes()).await
    }
}

#[async_trait]
impl StarredStore for FileStateStore {
    async fn starred_ids(&self) -> Result<BTreeSet<String>> {
        match self.read(STARRED_FILE).await? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(BTreeSet::new()),
        }
    }

    async fn set_starred(&self, unique_id: &str, starred: bool) -> Result<()> {
        let mut ids = self.starred_ids().await?;
        if starred {
            ids.insert(unique_id.to_string());
        } else {
            ids.remove(unique_id);
        }
        let json = serde_json::to_vec(&ids)?;
        self.write(STARRED_FILE, &json).await
    }
}

#[async_trait]
impl UserEventStore for FileStateStore {
    async fn user_events(&self) -> Result<Vec<EventRecord>> {
        match self.read(USER_EVENTS_FILE).await? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_user_events(&self, events: &[EventRecord]) -> Result<()> {
        let json = serde_json::to_vec(events)?;
        self.write(USER_EVENTS_FILE, &json).await
    }
}
