//! Structural extraction of events from a listing page.

pub mod date_range;

use chrono::Datelike;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::ListingFilter;
use crate::constants::{
    EVENT_CONTAINER_SELECTOR, EVENT_DATETIME_SELECTOR, EVENT_LINK_SELECTOR, EVENT_TITLE_SELECTOR,
    NOTICE_SELECTOR,
};
use crate::error::{Result, ScraperError};
use crate::types::RawEvent;
use date_range::DateRangeParser;

static NOTICE: Lazy<Selector> = Lazy::new(|| selector(NOTICE_SELECTOR));
static CONTAINER: Lazy<Selector> = Lazy::new(|| selector(EVENT_CONTAINER_SELECTOR));
static TITLE: Lazy<Selector> = Lazy::new(|| selector(EVENT_TITLE_SELECTOR));
static LINK: Lazy<Selector> = Lazy::new(|| selector(EVENT_LINK_SELECTOR));
static DATETIME: Lazy<Selector> = Lazy::new(|| selector(EVENT_DATETIME_SELECTOR));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("listing selectors are valid CSS")
}

/// Everything the pipeline needs from one fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub events: Vec<RawEvent>,
    /// False when the "no more events" notice is shown or no containers exist.
    pub has_listing: bool,
}

pub struct EventExtractor;

impl EventExtractor {
    /// Ordered raw events plus the listing signal, from a single parse.
    /// Containers missing a title, link or date are dropped.
    pub fn extract_page(body: &str) -> ExtractedPage {
        let document = Html::parse_document(body);
        let has_listing = Self::document_has_listing(&document);
        let events = Self::document_events(&document);
        ExtractedPage {
            events,
            has_listing,
        }
    }

    pub fn has_events(body: &str) -> bool {
        Self::document_has_listing(&Html::parse_document(body))
    }

    /// Oracle answer for discovery under the given filter.
    pub fn matches_filter(body: &str, filter: ListingFilter, dates: &DateRangeParser) -> bool {
        let document = Html::parse_document(body);
        if !Self::document_has_listing(&document) {
            return false;
        }
        match filter {
            ListingFilter::AnyEvents => true,
            ListingFilter::CurrentYear => {
                let current_year = dates.today().year();
                document.select(&CONTAINER).any(|container| {
                    container
                        .select(&DATETIME)
                        .next()
                        .map(|el| dates.parse(&date_text(el)).start.year() == current_year)
                        .unwrap_or(false)
                })
            }
        }
    }

    fn document_has_listing(document: &Html) -> bool {
        if document.select(&NOTICE).next().is_some() {
            debug!("Listing page carries the no-events notice");
            return false;
        }
        document.select(&CONTAINER).next().is_some()
    }

    fn document_events(document: &Html) -> Vec<RawEvent> {
        let mut events = Vec::new();
        for (index, container) in document.select(&CONTAINER).enumerate() {
            match Self::container_event(container) {
                Ok(event) => events.push(event),
                Err(e) => debug!("Skipping event container {}: {}", index, e),
            }
        }
        events
    }

    fn container_event(container: ElementRef) -> Result<RawEvent> {
        let title = container
            .select(&TITLE)
            .next()
            .ok_or_else(|| ScraperError::Extraction("missing title".into()))?;
        let link = container
            .select(&LINK)
            .next()
            .ok_or_else(|| ScraperError::Extraction("missing title link".into()))?;
        let datetime = container
            .select(&DATETIME)
            .next()
            .ok_or_else(|| ScraperError::Extraction("missing date".into()))?;

        Ok(RawEvent {
            title: collapsed_text(title),
            raw_date_text: date_text(datetime),
            link: link.value().attr("href").unwrap_or_default().to_string(),
        })
    }
}

fn collapsed_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Date text with any `@ time` suffix removed.
fn date_text(element: ElementRef) -> String {
    let text = collapsed_text(element);
    text.split('@').next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing(containers: &[&str]) -> String {
        format!(
            "<html><body><div class=\"tribe-events-calendar-list\">{}</div></body></html>",
            containers.join("\n")
        )
    }

    fn container(title: &str, date: &str, href: &str) -> String {
        format!(
            r#"<article class="tribe-events-calendar-list__event">
                <time class="tribe-events-calendar-list__event-datetime">{date}</time>
                <h3 class="tribe-events-calendar-list__event-title">
                    <a class="tribe-events-calendar-list__event-title-link" href="{href}">{title}</a>
                </h3>
            </article>"#
        )
    }

    #[test]
    fn test_extracts_events_in_document_order() {
        let body = listing(&[
            &container("Spring Dressage", "May 16 @ 8:00 am - 5:00 pm", "https://x/1"),
            &container("Hunter  Pace", "May 16 - May 18", "https://x/2"),
        ]);
        let events = EventExtractor::extract_page(&body).events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Spring Dressage");
        assert_eq!(events[0].raw_date_text, "May 16");
        assert_eq!(events[0].link, "https://x/1");
        assert_eq!(events[1].title, "Hunter Pace");
        assert_eq!(events[1].raw_date_text, "May 16 - May 18");
        assert!(EventExtractor::has_events(&body));
    }

    #[test]
    fn test_skips_malformed_containers() {
        let broken = r#"<article class="tribe-events-calendar-list__event">
            <h3 class="tribe-events-calendar-list__event-title">No date here</h3>
        </article>"#;
        let body = listing(&[broken, &container("Kept", "June 1", "https://x/k")]);
        let page = EventExtractor::extract_page(&body);
        assert!(page.has_listing);
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].title, "Kept");
    }

    #[test]
    fn test_missing_href_yields_empty_link() {
        let body = listing(&[r#"<div class="tribe-events-calendar-list__event">
            <span class="tribe-events-calendar-list__event-datetime">July 4</span>
            <h3 class="tribe-events-calendar-list__event-title">
                <a class="tribe-events-calendar-list__event-title-link">Parade</a>
            </h3>
        </div>"#]);
        let events = EventExtractor::extract_page(&body).events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].link, "");
    }

    #[test]
    fn test_notice_means_no_events() {
        let body = format!(
            "{}<div class=\"tribe-events-c-messages__message--notice\">There are no upcoming events.</div>",
            listing(&[&container("Leftover", "May 1", "https://x")])
        );
        assert!(!EventExtractor::has_events(&body));
    }

    #[test]
    fn test_empty_page_has_no_events() {
        let page = EventExtractor::extract_page(&listing(&[]));
        assert!(!page.has_listing);
        assert!(page.events.is_empty());
    }

    #[test]
    fn test_current_year_filter() {
        let dates = DateRangeParser::new(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        let old = listing(&[&container("Old", "May 16, 2025", "https://x")]);
        let current = listing(&[
            &container("Old", "May 16, 2025", "https://x"),
            &container("New", "May 16", "https://y"),
        ]);
        assert!(EventExtractor::matches_filter(&old, ListingFilter::AnyEvents, &dates));
        assert!(!EventExtractor::matches_filter(&old, ListingFilter::CurrentYear, &dates));
        assert!(EventExtractor::matches_filter(&current, ListingFilter::CurrentYear, &dates));
    }
}
