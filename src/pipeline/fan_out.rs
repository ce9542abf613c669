use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::PageFetcher;
use crate::error::{Result, ScraperError};
use crate::parser::date_range::DateRangeParser;
use crate::parser::EventExtractor;
use crate::pipeline::response_cache::ResponseCache;
use crate::types::EventRecord;

/// Events and diagnostics from one page.
#[derive(Debug, Default)]
struct PageEvents {
    events: Vec<EventRecord>,
    date_fallbacks: Vec<String>,
}

/// Combined result of a fan-out, in page order.
#[derive(Debug, Default, Clone)]
pub struct FanOutResult {
    pub events: Vec<EventRecord>,
    pub failed_pages: Vec<u32>,
    /// Raw date texts that could not be parsed and were dated today.
    pub date_fallbacks: Vec<String>,
}

/// Fetches and parses pages `1..=N`, one task per page, with network I/O
/// limited by a permit pool.
pub struct ConcurrentPageScraper {
    fetcher: Arc<dyn PageFetcher>,
    cache: ResponseCache,
    permits: Arc<Semaphore>,
    dates: DateRangeParser,
}

impl ConcurrentPageScraper {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: ResponseCache,
        concurrency_limit: usize,
        dates: DateRangeParser,
    ) -> Self {
        Self {
            fetcher,
            cache,
            permits: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            dates,
        }
    }

    #[instrument(skip(self))]
    pub async fn scrape_pages(&self, last_page: u32) -> FanOutResult {
        let handles: Vec<_> = (1..=last_page)
            .map(|page| {
                let fetcher = Arc::clone(&self.fetcher);
                let cache = self.cache.clone();
                let permits = Arc::clone(&self.permits);
                let dates = self.dates;
                let handle = tokio::spawn(async move {
                    scrape_page(fetcher, cache, permits, dates, page).await
                });
                (page, handle)
            })
            .collect();

        // Joined in page order, so completion order never leaks into the output.
        let mut result = FanOutResult::default();
        for (page, handle) in handles {
            match handle.await {
                Ok(Ok(page_events)) => {
                    debug!("Page {} contributed {} events", page, page_events.events.len());
                    result.events.extend(page_events.events);
                    result.date_fallbacks.extend(page_events.date_fallbacks);
                }
                Ok(Err(e)) => {
                    warn!("Page {} skipped: {}", page, e);
                    result.failed_pages.push(page);
                }
                Err(e) => {
                    warn!("Task for page {} did not finish: {}", page, e);
                    result.failed_pages.push(page);
                }
            }
        }

        crate::observability::metrics::scrape::events_extracted(result.events.len());
        info!(
            "Scraped {} events from {} pages ({} failed)",
            result.events.len(),
            last_page,
            result.failed_pages.len()
        );
        result
    }
}

async fn scrape_page(
    fetcher: Arc<dyn PageFetcher>,
    cache: ResponseCache,
    permits: Arc<Semaphore>,
    dates: DateRangeParser,
    page: u32,
) -> Result<PageEvents> {
    let body = match cache.get(page) {
        Some(body) => {
            crate::observability::metrics::fetch::cache_hit();
            body
        }
        None => {
            let permit = permits
                .acquire()
                .await
                .map_err(|e| ScraperError::network(page, format!("permit pool closed: {}", e)))?;
            let fetched = fetcher.fetch_page(page).await;
            drop(permit);

            let body: Arc<str> = Arc::from(fetched?);
            cache.insert(page, body.clone());
            body
        }
    };

    let extracted = EventExtractor::extract_page(&body);
    if !extracted.has_listing {
        debug!("Page {} shows no listing; it may have emptied since discovery", page);
    }

    let mut page_events = PageEvents::default();
    for raw in extracted.events {
        let (range, error) = dates.parse_with_diagnostic(&raw.raw_date_text);
        if error.is_some() {
            page_events.date_fallbacks.push(raw.raw_date_text.clone());
        }
        page_events.events.push(EventRecord::new(raw, range));
    }
    Ok(page_events)
}
