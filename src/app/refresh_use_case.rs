use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::ports::{EventSource, RefreshLog, SnapshotStore, StarredStore, UserEventStore};
use crate::error::Result;
use crate::parser::date_range::DateRangeParser;
use crate::types::{EventRecord, ListedEvent, RawEvent, SnapshotEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Fresh,
    Cached,
}

#[derive(Debug, Clone)]
pub struct LoadedEvents {
    pub events: Vec<ListedEvent>,
    /// Origin of the scraped part; user-added events are always appended.
    pub origin: EventOrigin,
    /// Set when a fresh scrape failed or came back incomplete.
    pub notice: Option<String>,
}

/// Chooses between a fresh scrape and the cached snapshot, appends the
/// user's own events and annotates everything with starred flags.
pub struct RefreshUseCase {
    source: Arc<dyn EventSource>,
    snapshots: Arc<dyn SnapshotStore>,
    refresh_log: Arc<dyn RefreshLog>,
    starred: Arc<dyn StarredStore>,
    user_events: Arc<dyn UserEventStore>,
    max_age: Duration,
}

impl RefreshUseCase {
    pub fn new(
        source: Arc<dyn EventSource>,
        snapshots: Arc<dyn SnapshotStore>,
        refresh_log: Arc<dyn RefreshLog>,
        starred: Arc<dyn StarredStore>,
        user_events: Arc<dyn UserEventStore>,
        max_age: Duration,
    ) -> Self {
        Self {
            source,
            snapshots,
            refresh_log,
            starred,
            user_events,
            max_age,
        }
    }

    /// Scrape when forced, never refreshed, stale, or without a snapshot;
    /// otherwise serve the snapshot. A failed or incomplete scrape falls
    /// back to the snapshot when there is one and is not recorded as a
    /// refresh.
    pub async fn load(
        &self,
        force: bool,
        now: DateTime<Utc>,
        dates: &DateRangeParser,
    ) -> Result<LoadedEvents> {
        let last_refresh = match self.refresh_log.last_refreshed().await {
            Ok(at) => at,
            Err(e) => {
                warn!("Ignoring unreadable refresh time: {}", e);
                None
            }
        };
        let cached = match self.snapshots.load_snapshot().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable snapshot: {}", e);
                None
            }
        };

        let stale = match last_refresh {
            Some(at) => now - at >= self.max_age,
            None => true,
        };

        let (events, origin, notice) = match cached {
            Some(entries) if !force && !stale => {
                info!("Serving {} cached events", entries.len());
                (events_from_snapshot(entries, dates), EventOrigin::Cached, None)
            }
            cached => match self.source.fetch_events().await {
                Ok(fetched) if fetched.is_complete() => {
                    if let Err(e) = self.refresh_log.mark_refreshed(now).await {
                        warn!("Failed to record refresh time: {}", e);
                    }
                    (fetched.events, EventOrigin::Fresh, None)
                }
                Ok(fetched) => {
                    let missing = missing_pages_message(&fetched.failed_pages);
                    warn!("Fresh scrape was incomplete: {}", missing);
                    match cached {
                        Some(entries) => {
                            let notice = format!("Showing cached data. {}", missing);
                            (events_from_snapshot(entries, dates), EventOrigin::Cached, Some(notice))
                        }
                        None => {
                            let notice = format!("Showing partial data. {}", missing);
                            (fetched.events, EventOrigin::Fresh, Some(notice))
                        }
                    }
                }
                Err(e) => match cached {
                    Some(entries) => {
                        warn!("Fresh scrape failed, serving cached events: {}", e);
                        let notice = format!("Showing cached data. {}", e);
                        (events_from_snapshot(entries, dates), EventOrigin::Cached, Some(notice))
                    }
                    None => return Err(e),
                },
            },
        };

        let user_events = self.user_events.user_events().await.unwrap_or_else(|e| {
            warn!("Ignoring unreadable user events: {}", e);
            Vec::new()
        });

        let starred = self.starred_ids().await;
        let mut listed = annotate(events, &starred, false);
        listed.extend(annotate(user_events, &starred, true));
        Ok(LoadedEvents {
            events: listed,
            origin,
            notice,
        })
    }

    pub async fn toggle_star(&self, unique_id: &str) -> Result<bool> {
        toggle_star(self.starred.as_ref(), unique_id).await
    }

    async fn starred_ids(&self) -> BTreeSet<String> {
        self.starred.starred_ids().await.unwrap_or_else(|e| {
            warn!("Ignoring unreadable starred set: {}", e);
            BTreeSet::new()
        })
    }
}

/// Flip the starred flag of `unique_id` in `store`, returning the new state.
pub async fn toggle_star(store: &dyn StarredStore, unique_id: &str) -> Result<bool> {
    let starred = !store.starred_ids().await?.contains(unique_id);
    store.set_starred(unique_id, starred).await?;
    Ok(starred)
}

/// Rebuild records from a stored snapshot, re-parsing the date text.
pub fn events_from_snapshot(entries: Vec<SnapshotEntry>, dates: &DateRangeParser) -> Vec<EventRecord> {
    entries
        .into_iter()
        .map(|entry| {
            let raw = RawEvent::from(entry);
            let range = dates.parse(&raw.raw_date_text);
            EventRecord::new(raw, range)
        })
        .collect()
}

fn missing_pages_message(pages: &[u32]) -> String {
    let list: Vec<String> = pages.iter().map(u32::to_string).collect();
    format!("Listing pages {} could not be fetched", list.join(", "))
}

fn annotate(
    events: Vec<EventRecord>,
    starred: &BTreeSet<String>,
    user_added: bool,
) -> Vec<ListedEvent> {
    events
        .into_iter()
        .map(|event| {
            let starred = starred.contains(&event.unique_id);
            ListedEvent {
                event,
                starred,
                user_added,
            }
        })
        .collect()
}
