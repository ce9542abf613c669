use chrono::{Datelike, Weekday};
use std::collections::HashSet;

use crate::types::{EventRecord, ListedEvent};

/// Filters applied to a loaded listing before display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub starred_only: bool,
    /// Keep events touching any of these days; empty keeps every event.
    pub weekdays: HashSet<Weekday>,
}

impl ListingQuery {
    pub fn matches(&self, listed: &ListedEvent) -> bool {
        if self.starred_only && !listed.starred {
            return false;
        }
        self.weekdays.is_empty() || occurs_on_any(&listed.event, &self.weekdays)
    }

    /// Matching events ordered by start date. Events starting on the same
    /// day keep their listing order.
    pub fn apply(&self, events: Vec<ListedEvent>) -> Vec<ListedEvent> {
        let mut kept: Vec<ListedEvent> = events.into_iter().filter(|e| self.matches(e)).collect();
        kept.sort_by_key(|e| e.event.start_date);
        kept
    }
}

/// Whether any day from start to end (inclusive) falls on one of `weekdays`.
/// A week covers every weekday, so longer ranges stop after seven days.
fn occurs_on_any(event: &EventRecord, weekdays: &HashSet<Weekday>) -> bool {
    let end = event.end_date.unwrap_or(event.start_date);
    event
        .start_date
        .iter_days()
        .take_while(|day| *day <= end)
        .take(7)
        .any(|day| weekdays.contains(&day.weekday()))
}
