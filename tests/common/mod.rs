#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use equine_events::app::ports::PageFetcher;
use equine_events::error::{Result, ScraperError};

/// A fake tribe-events listing: pages `1..=last_page` carry events, later
/// pages show the "no more events" notice.
pub struct MockSite {
    last_page: AtomicU32,
    events_per_page: usize,
    failing: Mutex<HashSet<u32>>,
    latency: Mutex<HashMap<u32, Duration>>,
    fetch_log: Mutex<Vec<u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSite {
    pub fn new(last_page: u32, events_per_page: usize) -> Self {
        Self {
            last_page: AtomicU32::new(last_page),
            events_per_page,
            failing: Mutex::new(HashSet::new()),
            latency: Mutex::new(HashMap::new()),
            fetch_log: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_last_page(&self, last_page: u32) {
        self.last_page.store(last_page, Ordering::SeqCst);
    }

    pub fn fail_page(&self, page: u32) {
        self.failing.lock().unwrap().insert(page);
    }

    pub fn fail_all(&self, up_to: u32) {
        let mut failing = self.failing.lock().unwrap();
        for page in 1..=up_to {
            failing.insert(page);
        }
    }

    pub fn set_latency(&self, page: u32, latency: Duration) {
        self.latency.lock().unwrap().insert(page, latency);
    }

    pub fn fetches(&self) -> Vec<u32> {
        self.fetch_log.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().unwrap().len()
    }

    pub fn clear_fetches(&self) {
        self.fetch_log.lock().unwrap().clear();
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn title(page: u32, index: usize) -> String {
        format!("Event {}-{}", page, index)
    }

    pub fn render(&self, page: u32) -> String {
        if page == 0 || page > self.last_page.load(Ordering::SeqCst) {
            return r#"<html><body>
                <div class="tribe-events-c-messages__message--notice">There were no results found.</div>
            </body></html>"#
                .to_string();
        }

        let containers: Vec<String> = (0..self.events_per_page)
            .map(|index| {
                format!(
                    r#"<article class="tribe-events-calendar-list__event">
                        <div class="tribe-events-calendar-list__event-datetime">June {day} @ 9:00 am - 4:00 pm</div>
                        <h3 class="tribe-events-calendar-list__event-title">
                            <a class="tribe-events-calendar-list__event-title-link" href="https://example.com/event/{page}/{index}">{title}</a>
                        </h3>
                    </article>"#,
                    day = index + 1,
                    page = page,
                    index = index,
                    title = Self::title(page, index),
                )
            })
            .collect();
        format!(
            "<html><body><div class=\"tribe-events-calendar-list\">{}</div></body></html>",
            containers.join("\n")
        )
    }
}

#[async_trait]
impl PageFetcher for MockSite {
    async fn fetch_page(&self, page: u32) -> Result<String> {
        self.fetch_log.lock().unwrap().push(page);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self.latency.lock().unwrap().get(&page).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&page) {
            return Err(ScraperError::network(page, "connection reset"));
        }
        Ok(self.render(page))
    }
}

/// Titles expected from pages `pages`, in order.
pub fn expected_titles(pages: &[u32], events_per_page: usize) -> Vec<String> {
    pages
        .iter()
        .flat_map(|&page| (0..events_per_page).map(move |index| MockSite::title(page, index)))
        .collect()
}
