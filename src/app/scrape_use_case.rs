use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::app::ports::{DiscoveryCache, EventSource, PageFetcher, SnapshotStore};
use crate::config::ScrapeConfig;
use crate::error::{Result, ScraperError};
use crate::infra::http_client::ReqwestPageFetcher;
use crate::parser::date_range::DateRangeParser;
use crate::pipeline::{discover_last_page, ConcurrentPageScraper, ListingOracle, ResponseCache};
use crate::types::{EventRecord, FetchedEvents, SnapshotEntry};

/// Outcome of one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub events: Vec<EventRecord>,
    pub last_page: u32,
    pub failed_pages: Vec<u32>,
    pub date_fallbacks: Vec<String>,
}

/// Discovery followed by the concurrent fetch of every page.
pub struct EventScraper {
    config: ScrapeConfig,
    fetcher: Arc<dyn PageFetcher>,
    hints: Arc<dyn DiscoveryCache>,
    snapshots: Arc<dyn SnapshotStore>,
    today: Option<NaiveDate>,
}

impl EventScraper {
    /// Scraper over HTTP. Fails only if the config is invalid or the HTTP
    /// client cannot be built.
    pub fn new(
        config: ScrapeConfig,
        hints: Arc<dyn DiscoveryCache>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(ReqwestPageFetcher::new(&config)?);
        Ok(Self::with_fetcher(config, fetcher, hints, snapshots))
    }

    pub fn with_fetcher(
        config: ScrapeConfig,
        fetcher: Arc<dyn PageFetcher>,
        hints: Arc<dyn DiscoveryCache>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            config,
            fetcher,
            hints,
            snapshots,
            today: None,
        }
    }

    /// Pin the reference date used for default years and fallbacks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub async fn scrape(&self) -> Result<Vec<EventRecord>> {
        Ok(self.scrape_with_report().await?.events)
    }

    /// Run discovery and the fan-out, then persist the page count, and the
    /// snapshot when every page was fetched. Page-level failures are
    /// reported, not returned; the only error is a listing that could not
    /// be reached at all.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn scrape_with_report(&self) -> Result<ScrapeReport> {
        let dates = self
            .today
            .map(DateRangeParser::new)
            .unwrap_or_else(DateRangeParser::for_today);
        let cache = ResponseCache::new();

        let hint = match self.hints.load_hint().await {
            Ok(hint) => hint,
            Err(e) => {
                warn!("Ignoring unreadable last page hint: {}", e);
                None
            }
        };

        let oracle = ListingOracle::new(
            Arc::clone(&self.fetcher),
            cache.clone(),
            self.config.listing_filter,
            dates,
        );
        let last_page = discover_last_page(&oracle, hint).await;
        crate::observability::metrics::discovery::completed(oracle.probe_count(), last_page);
        info!(
            "Discovery finished: last page {} after {} probes ({} fetched, {} cached)",
            last_page,
            oracle.probe_count(),
            oracle.fetch_count(),
            cache.len()
        );

        if last_page == 0 && oracle.unreachable() {
            return Err(ScraperError::network(
                hint.unwrap_or(1),
                "no listing page could be fetched",
            ));
        }

        let scraper = ConcurrentPageScraper::new(
            Arc::clone(&self.fetcher),
            cache,
            self.config.concurrency_limit,
            dates,
        );
        let fan_out = scraper.scrape_pages(last_page).await;

        if let Err(e) = self.hints.save_hint(last_page).await {
            warn!("Failed to save last page hint: {}", e);
        }
        // A partial list must not replace a complete snapshot.
        if fan_out.failed_pages.is_empty() {
            let entries: Vec<SnapshotEntry> = fan_out
                .events
                .iter()
                .map(EventRecord::to_snapshot_entry)
                .collect();
            if let Err(e) = self.snapshots.save_snapshot(&entries).await {
                warn!("Failed to save event snapshot: {}", e);
            }
        } else {
            warn!(
                "Keeping previous snapshot; pages {:?} could not be fetched",
                fan_out.failed_pages
            );
        }

        Ok(ScrapeReport {
            events: fan_out.events,
            last_page,
            failed_pages: fan_out.failed_pages,
            date_fallbacks: fan_out.date_fallbacks,
        })
    }
}

#[async_trait]
impl EventSource for EventScraper {
    async fn fetch_events(&self) -> Result<FetchedEvents> {
        let report = self.scrape_with_report().await?;
        Ok(FetchedEvents {
            events: report.events,
            failed_pages: report.failed_pages,
        })
    }
}

/// Scrape the listing over HTTP with the given stores.
pub async fn scrape(
    config: ScrapeConfig,
    hints: Arc<dyn DiscoveryCache>,
    snapshots: Arc<dyn SnapshotStore>,
) -> Result<Vec<EventRecord>> {
    EventScraper::new(config, hints, snapshots)?.scrape().await
}
