//! Hand-entered events that are listed next to the scraped ones.

use chrono::NaiveDate;
use tracing::info;

use crate::app::ports::UserEventStore;
use crate::error::{Result, ScraperError};
use crate::parser::date_range::DateRange;
use crate::types::{EventRecord, RawEvent};

/// Fields a user supplies for a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserEvent {
    pub title: String,
    pub start_date: NaiveDate,
    /// `None` for a single-day event.
    pub end_date: Option<NaiveDate>,
    pub link: Option<String>,
}

impl NewUserEvent {
    /// Build the record, deriving the raw date text the way the listing
    /// writes dates (`August 1, 2026 - August 3, 2026`).
    pub fn into_record(self) -> Result<EventRecord> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ScraperError::InvalidEvent("title is required".to_string()));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ScraperError::InvalidEvent(format!(
                    "end date {} is before start date {}",
                    end, self.start_date
                )));
            }
        }

        let raw_date_text = match self.end_date {
            Some(end) => format!("{} - {}", long_date(self.start_date), long_date(end)),
            None => long_date(self.start_date),
        };
        let raw = RawEvent {
            title,
            raw_date_text,
            link: self.link.map(|l| l.trim().to_string()).unwrap_or_default(),
        };
        Ok(EventRecord::new(
            raw,
            DateRange {
                start: self.start_date,
                end: self.end_date,
            },
        ))
    }
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Store a new event. Adding an event identical to a stored one replaces it.
pub async fn add_user_event(store: &dyn UserEventStore, new: NewUserEvent) -> Result<EventRecord> {
    let record = new.into_record()?;
    let mut events = store.user_events().await?;
    events.retain(|e| e.unique_id != record.unique_id);
    events.push(record.clone());
    store.save_user_events(&events).await?;
    info!("Added user event {} ({})", record.unique_id, record.title);
    Ok(record)
}

/// Delete the event with `unique_id`. Returns whether one was removed.
pub async fn remove_user_event(store: &dyn UserEventStore, unique_id: &str) -> Result<bool> {
    let mut events = store.user_events().await?;
    let before = events.len();
    events.retain(|e| e.unique_id != unique_id);
    if events.len() == before {
        return Ok(false);
    }
    store.save_user_events(&events).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::in_memory::InMemoryStateStore;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_event(title: &str, end: Option<NaiveDate>) -> NewUserEvent {
        NewUserEvent {
            title: title.to_string(),
            start_date: ymd(2026, 8, 1),
            end_date: end,
            link: None,
        }
    }

    #[test]
    fn test_record_uses_listing_date_text() {
        let single = new_event("Barn Party", None).into_record().unwrap();
        assert_eq!(single.raw_date_text, "August 1, 2026");
        assert_eq!(single.end_date, None);
        assert_eq!(single.link, "");

        let range = new_event("Clinic", Some(ymd(2026, 8, 3))).into_record().unwrap();
        assert_eq!(range.raw_date_text, "August 1, 2026 - August 3, 2026");
        assert_eq!(range.end_date, Some(ymd(2026, 8, 3)));
    }

    #[test]
    fn test_invalid_events_are_rejected() {
        assert!(matches!(
            new_event("   ", None).into_record(),
            Err(ScraperError::InvalidEvent(_))
        ));
        assert!(matches!(
            new_event("Clinic", Some(ymd(2026, 7, 30))).into_record(),
            Err(ScraperError::InvalidEvent(_))
        ));
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let store = InMemoryStateStore::new();
        let added = add_user_event(&store, new_event("Barn Party", None)).await.unwrap();
        add_user_event(&store, new_event("Barn Party", None)).await.unwrap();
        assert_eq!(store.user_events().await.unwrap(), vec![added.clone()]);

        assert!(remove_user_event(&store, &added.unique_id).await.unwrap());
        assert!(!remove_user_event(&store, &added.unique_id).await.unwrap());
        assert!(store.user_events().await.unwrap().is_empty());
    }
}
