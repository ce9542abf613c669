pub mod config;
pub mod constants;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod types;

// Layered boundaries: use cases and ports, adapters, and observability
pub mod app;
pub mod infra;
pub mod observability;

pub use app::scrape_use_case::{scrape, EventScraper, ScrapeReport};
pub use error::{Result, ScraperError};
pub use types::EventRecord;
