use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::parser::date_range::DateRange;

/// Fields pulled out of one event container before date parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub title: String,
    pub raw_date_text: String,
    pub link: String,
}

/// A scraped or user-entered event. Records are immutable once built;
/// cross-run identity rides on `unique_id` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub raw_date_text: String,
    pub start_date: NaiveDate,
    /// `None` for single-day events.
    pub end_date: Option<NaiveDate>,
    pub link: String,
    pub unique_id: String,
}

impl EventRecord {
    pub fn new(raw: RawEvent, dates: DateRange) -> Self {
        let unique_id = event_unique_id(&raw.title, &raw.raw_date_text, &raw.link);
        Self {
            title: raw.title,
            raw_date_text: raw.raw_date_text,
            start_date: dates.start,
            end_date: dates.end,
            link: raw.link,
            unique_id,
        }
    }

    pub fn to_snapshot_entry(&self) -> SnapshotEntry {
        SnapshotEntry {
            title: self.title.clone(),
            raw_date_text: self.raw_date_text.clone(),
            link: self.link.clone(),
        }
    }

    /// Human-readable date such as `Saturday, May 16` or
    /// `Saturday, May 16 - Monday, May 18`. The year is appended only when
    /// it differs from `today`'s year.
    pub fn display_date(&self, today: NaiveDate) -> String {
        let current_year = today.year();
        let show_year = self.start_date.year() != current_year;
        let start = format_day(self.start_date, show_year);

        match self.end_date {
            Some(end) if end != self.start_date => {
                let show_end_year = show_year || end.year() != current_year;
                format!("{} - {}", start, format_day(end, show_end_year))
            }
            _ => start,
        }
    }
}

fn format_day(date: NaiveDate, with_year: bool) -> String {
    if with_year {
        date.format("%A, %B %-d, %Y").to_string()
    } else {
        date.format("%A, %B %-d").to_string()
    }
}

/// Short digest of the identifying fields. Only 32 bits survive, so two
/// different events can collide.
pub fn event_unique_id(title: &str, raw_date_text: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}_{}_{}", title, raw_date_text, link).as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}

/// On-disk shape of one cached event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub title: String,
    #[serde(rename = "rawDateText")]
    pub raw_date_text: String,
    #[serde(default)]
    pub link: String,
}

impl From<SnapshotEntry> for RawEvent {
    fn from(entry: SnapshotEntry) -> Self {
        RawEvent {
            title: entry.title,
            raw_date_text: entry.raw_date_text,
            link: entry.link,
        }
    }
}

/// Result of one fresh fetch of the listing. `failed_pages` lists pages
/// whose events are missing from `events`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedEvents {
    pub events: Vec<EventRecord>,
    pub failed_pages: Vec<u32>,
}

impl FetchedEvents {
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty()
    }
}

/// An event annotated with the caller's starred flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEvent {
    #[serde(flatten)]
    pub event: EventRecord,
    pub starred: bool,
    /// Entered by hand rather than scraped.
    pub user_added: bool,
}
