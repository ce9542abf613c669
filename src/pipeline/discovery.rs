//! Finds the last listing page with events, reusing the previous run's
//! answer when the site has not changed.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::PageFetcher;
use crate::config::ListingFilter;
use crate::constants::{COLD_START_UPPER_PROBE, HINT_UPPER_PROBE_OFFSET};
use crate::parser::date_range::DateRangeParser;
use crate::parser::EventExtractor;
use crate::pipeline::response_cache::ResponseCache;
use crate::pipeline::search::{last_true_page, Bracket, PageOracle, Probe};

/// Oracle backed by real page fetches. Every probe checks the response
/// cache first and stores what it fetches.
pub struct ListingOracle {
    fetcher: Arc<dyn PageFetcher>,
    cache: ResponseCache,
    filter: ListingFilter,
    dates: DateRangeParser,
    probes: AtomicUsize,
    fetched: AtomicUsize,
    failures: AtomicUsize,
}

impl ListingOracle {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: ResponseCache,
        filter: ListingFilter,
        dates: DateRangeParser,
    ) -> Self {
        Self {
            fetcher,
            cache,
            filter,
            dates,
            probes: AtomicUsize::new(0),
            fetched: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    /// Network fetches issued (cache hits excluded).
    pub fn fetch_count(&self) -> usize {
        self.fetched.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// True when every probe so far failed to fetch its page.
    pub fn unreachable(&self) -> bool {
        let probes = self.probe_count();
        probes > 0 && self.failure_count() == probes
    }
}

#[async_trait]
impl PageOracle for ListingOracle {
    async fn probe(&self, page: u32) -> Probe {
        self.probes.fetch_add(1, Ordering::Relaxed);

        let body = match self.cache.get(page) {
            Some(body) => {
                crate::observability::metrics::fetch::cache_hit();
                body
            }
            None => {
                self.fetched.fetch_add(1, Ordering::Relaxed);
                match self.fetcher.fetch_page(page).await {
                    Ok(body) => {
                        let body: Arc<str> = Arc::from(body);
                        self.cache.insert(page, body.clone());
                        body
                    }
                    Err(e) => {
                        warn!("Discovery probe of page {} failed: {}", page, e);
                        self.failures.fetch_add(1, Ordering::Relaxed);
                        return Probe::Failed;
                    }
                }
            }
        };

        if EventExtractor::matches_filter(&body, self.filter, &self.dates) {
            debug!("Page {} has events", page);
            Probe::Events
        } else {
            debug!("Page {} has no events", page);
            Probe::Empty
        }
    }
}

/// Last page index with events, or 0 for an empty listing.
///
/// With a hint, page `hint` is re-checked first: if it lost its events the
/// hint is discarded, if `hint + 1` is empty the hint is returned as is,
/// and otherwise the search continues upward from the hint.
#[instrument(skip(oracle))]
pub async fn discover_last_page<O>(oracle: &O, hint: Option<u32>) -> u32
where
    O: PageOracle + ?Sized,
{
    let last_page = match hint.filter(|&h| h > 0) {
        Some(hint) => match oracle.probe(hint).await {
            Probe::Events => match oracle.probe(hint.saturating_add(1)).await {
                Probe::Events => {
                    info!("Listing grew past cached last page {}, searching upward", hint);
                    let right = hint.saturating_add(HINT_UPPER_PROBE_OFFSET);
                    last_true_page(oracle, Bracket::new(hint, right, hint)).await
                }
                Probe::Empty | Probe::Failed => {
                    debug!("Cached last page {} confirmed", hint);
                    crate::observability::metrics::discovery::hint_confirmed();
                    hint
                }
            },
            Probe::Empty | Probe::Failed => {
                info!("Cached last page {} no longer has events, rediscovering", hint);
                cold_discovery(oracle).await
            }
        },
        None => {
            debug!("No cached last page, running full discovery");
            cold_discovery(oracle).await
        }
    };

    info!("Last page with events: {}", last_page);
    last_page
}

async fn cold_discovery<O>(oracle: &O) -> u32
where
    O: PageOracle + ?Sized,
{
    last_true_page(oracle, Bracket::new(1, COLD_START_UPPER_PROBE, 0)).await
}
