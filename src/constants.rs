/// Defaults and markup markers for the tribe-events listing.

pub const DEFAULT_BASE_URL: &str = "https://dreamparknj.com/events";
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_MAX_AGE_DAYS: i64 = 7;
pub const DEFAULT_STATE_DIR: &str = ".equine_events";
pub const DEFAULT_LOG_DIR: &str = "logs";

// Discovery tuning
pub const COLD_START_UPPER_PROBE: u32 = 10;
pub const HINT_UPPER_PROBE_OFFSET: u32 = 5;

// Structural markers in the listing page
pub const NOTICE_SELECTOR: &str = ".tribe-events-c-messages__message--notice";
pub const EVENT_CONTAINER_SELECTOR: &str = ".tribe-events-calendar-list__event";
pub const EVENT_TITLE_SELECTOR: &str = ".tribe-events-calendar-list__event-title";
pub const EVENT_LINK_SELECTOR: &str = ".tribe-events-calendar-list__event-title-link";
pub const EVENT_DATETIME_SELECTOR: &str = ".tribe-events-calendar-list__event-datetime";

/// Build the listing URL for a 1-based page index.
pub fn page_url(base_url: &str, page: u32) -> String {
    format!("{}/list/page/{}", base_url.trim_end_matches('/'), page)
}
