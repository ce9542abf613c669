pub mod listing_query;
pub mod ports;
pub mod refresh_use_case;
pub mod scrape_use_case;
pub mod user_events;
