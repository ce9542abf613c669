pub mod discovery;
pub mod fan_out;
pub mod response_cache;
pub mod search;

pub use discovery::{discover_last_page, ListingOracle};
pub use fan_out::{ConcurrentPageScraper, FanOutResult};
pub use response_cache::ResponseCache;
pub use search::{Bracket, PageOracle, Probe};
