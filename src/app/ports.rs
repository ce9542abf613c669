use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::{EventRecord, FetchedEvents, SnapshotEntry};

/// Performs the network GET for one listing page and returns its body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<String>;
}

/// Cross-run memory of the last page that had events. A hint only; it is
/// always re-verified before use.
#[async_trait]
pub trait DiscoveryCache: Send + Sync {
    async fn load_hint(&self) -> Result<Option<u32>>;
    async fn save_hint(&self, last_page: u32) -> Result<()>;
}

/// The previously scraped event list, stored as `{title, rawDateText, link}`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load_snapshot(&self) -> Result<Option<Vec<SnapshotEntry>>>;
    async fn save_snapshot(&self, entries: &[SnapshotEntry]) -> Result<()>;
}

#[async_trait]
pub trait RefreshLog: Send + Sync {
    async fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>>;
    async fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()>;
}

/// Per-device starred events, keyed by `EventRecord::unique_id`.
#[async_trait]
pub trait StarredStore: Send + Sync {
    async fn starred_ids(&self) -> Result<BTreeSet<String>>;
    async fn set_starred(&self, unique_id: &str, starred: bool) -> Result<()>;
}

/// Events entered by hand, listed next to the scraped ones.
#[async_trait]
pub trait UserEventStore: Send + Sync {
    async fn user_events(&self) -> Result<Vec<EventRecord>>;
    async fn save_user_events(&self, events: &[EventRecord]) -> Result<()>;
}

/// Anything that can produce a fresh event list. A partial list reports
/// its missing pages instead of failing.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self) -> Result<FetchedEvents>;
}
