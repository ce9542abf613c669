//! Metric recording for the scrape pipeline.
//!
//! The crate only emits through the `metrics` facade; installing a recorder
//! or exporter is left to the host process.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Fetching
    PagesFetched,
    PageFetchErrors,
    ResponseCacheHits,

    // Discovery
    DiscoveryProbes,
    DiscoveryHintHits,
    DiscoveryLastPage,

    // Extraction
    EventsExtracted,
    DateFallbacks,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricName::PagesFetched => "equine_pages_fetched_total",
            MetricName::PageFetchErrors => "equine_page_fetch_errors_total",
            MetricName::ResponseCacheHits => "equine_response_cache_hits_total",
            MetricName::DiscoveryProbes => "equine_discovery_probes",
            MetricName::DiscoveryHintHits => "equine_discovery_hint_hits_total",
            MetricName::DiscoveryLastPage => "equine_discovery_last_page",
            MetricName::EventsExtracted => "equine_events_extracted_total",
            MetricName::DateFallbacks => "equine_date_fallbacks_total",
        };
        write!(f, "{}", name)
    }
}

pub mod fetch {
    use super::MetricName;

    pub fn page_fetched() {
        ::metrics::counter!(MetricName::PagesFetched.to_string()).increment(1);
    }

    pub fn page_failed() {
        ::metrics::counter!(MetricName::PageFetchErrors.to_string()).increment(1);
    }

    pub fn cache_hit() {
        ::metrics::counter!(MetricName::ResponseCacheHits.to_string()).increment(1);
    }
}

pub mod discovery {
    use super::MetricName;

    /// Record how many oracle evaluations one discovery run needed
    pub fn completed(probes: usize, last_page: u32) {
        ::metrics::histogram!(MetricName::DiscoveryProbes.to_string()).record(probes as f64);
        ::metrics::gauge!(MetricName::DiscoveryLastPage.to_string()).set(last_page as f64);
    }

    pub fn hint_confirmed() {
        ::metrics::counter!(MetricName::DiscoveryHintHits.to_string()).increment(1);
    }
}

pub mod scrape {
    use super::MetricName;

    pub fn events_extracted(count: usize) {
        ::metrics::counter!(MetricName::EventsExtracted.to_string()).increment(count as u64);
    }
}

pub mod dates {
    use super::MetricName;

    pub fn fallback_used() {
        ::metrics::counter!(MetricName::DateFallbacks.to_string()).increment(1);
    }
}
