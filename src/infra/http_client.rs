use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::app::ports::PageFetcher;
use crate::config::ScrapeConfig;
use crate::constants::page_url;
use crate::error::{Result, ScraperError};
use crate::observability::metrics;

/// Fetches listing pages over HTTP. The client and its connection pool are
/// released when the fetcher is dropped.
pub struct ReqwestPageFetcher {
    client: Client,
    base_url: String,
}

impl ReqwestPageFetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .gzip(true);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for ReqwestPageFetcher {
    #[instrument(skip(self))]
    async fn fetch_page(&self, page: u32) -> Result<String> {
        let url = page_url(&self.base_url, page);
        debug!("Fetching page {}: {}", page, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            metrics::fetch::page_failed();
            ScraperError::network(page, e.to_string())
        })?;

        // Past the last page the site answers 404 with an empty listing;
        // only server errors are failures.
        let status = response.status();
        if status.is_server_error() {
            metrics::fetch::page_failed();
            return Err(ScraperError::network(page, format!("server responded {}", status)));
        }

        let body = response.text().await.map_err(|e| {
            metrics::fetch::page_failed();
            ScraperError::network(page, e.to_string())
        })?;

        metrics::fetch::page_fetched();
        debug!("Page {} returned {} ({} bytes)", page, status.as_u16(), body.len());
        Ok(body)
    }
}
