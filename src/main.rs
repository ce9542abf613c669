use anyhow::Context;
use chrono::{Local, NaiveDate, Utc, Weekday};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use equine_events::app::listing_query::ListingQuery;
use equine_events::app::ports::DiscoveryCache;
use equine_events::app::refresh_use_case::{toggle_star, EventOrigin, RefreshUseCase};
use equine_events::app::user_events::{add_user_event, remove_user_event, NewUserEvent};
use equine_events::config::AppConfig;
use equine_events::infra::{FileStateStore, ReqwestPageFetcher};
use equine_events::observability::init_logging;
use equine_events::parser::date_range::DateRangeParser;
use equine_events::pipeline::{discover_last_page, ListingOracle, ResponseCache};
use equine_events::EventScraper;

#[derive(Parser)]
#[command(name = "equine_events")]
#[command(about = "Scrape a paginated event listing into a flat event list")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (optional)
    #[arg(long, default_value = "equine_events.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load events, scraping when the cached snapshot is stale
    Scrape {
        /// Scrape even if the snapshot is recent
        #[arg(long)]
        force: bool,
        /// Print events as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Only list starred events
        #[arg(long)]
        starred: bool,
        /// Only list events touching this weekday (e.g. sat); repeatable
        #[arg(long = "day")]
        days: Vec<Weekday>,
    },
    /// Find and store the last page with events
    Discover,
    /// Toggle the starred flag of an event by its unique id
    Star { id: String },
    /// Add an event of your own to the listing
    Add {
        #[arg(long)]
        title: String,
        /// First day, as YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,
        /// Last day of a multi-day event, as YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        link: Option<String>,
    },
    /// Remove an event you added, by its unique id
    Remove { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config).context("Failed to load configuration")?;
    let _guard = init_logging(&config.log_dir).context("Failed to initialize logging")?;

    let store = Arc::new(FileStateStore::new(config.state_dir.clone()));
    let dates = DateRangeParser::for_today();

    match cli.command {
        Commands::Scrape {
            force,
            json,
            starred,
            days,
        } => {
            let scraper = EventScraper::new(config.scrape.clone(), store.clone(), store.clone())
                .context("Failed to set up scraper")?;
            let refresh = RefreshUseCase::new(
                Arc::new(scraper),
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                config.refresh_max_age(),
            );

            let loaded = refresh
                .load(force, Utc::now(), &dates)
                .await
                .context("Failed to load events")?;
            if let Some(notice) = &loaded.notice {
                eprintln!("⚠️  {}", notice);
            }
            info!(
                "Loaded {} events ({})",
                loaded.events.len(),
                match loaded.origin {
                    EventOrigin::Fresh => "fresh",
                    EventOrigin::Cached => "cached",
                }
            );

            let query = ListingQuery {
                starred_only: starred,
                weekdays: days.into_iter().collect(),
            };
            let events = query.apply(loaded.events);

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                let today = Local::now().date_naive();
                for listed in &events {
                    let star = if listed.starred { "★" } else { " " };
                    println!(
                        "{} {}  {}  {}",
                        star,
                        listed.event.unique_id,
                        listed.event.display_date(today),
                        listed.event.title
                    );
                }
            }
        }
        Commands::Discover => {
            config.scrape.validate()?;
            let fetcher = Arc::new(ReqwestPageFetcher::new(&config.scrape)?);
            let oracle = ListingOracle::new(
                fetcher,
                ResponseCache::new(),
                config.scrape.listing_filter,
                dates,
            );
            let hint = store.load_hint().await.unwrap_or(None);
            let last_page = discover_last_page(&oracle, hint).await;
            store.save_hint(last_page).await?;
            println!("{}", last_page);
        }
        Commands::Star { id } => {
            let starred = toggle_star(store.as_ref(), &id).await?;
            println!("{} {}", id, if starred { "starred" } else { "unstarred" });
        }
        Commands::Add {
            title,
            start,
            end,
            link,
        } => {
            let new = NewUserEvent {
                title,
                start_date: start,
                end_date: end,
                link,
            };
            let record = add_user_event(store.as_ref(), new).await?;
            println!("{} added", record.unique_id);
        }
        Commands::Remove { id } => {
            if remove_user_event(store.as_ref(), &id).await? {
                println!("{} removed", id);
            } else {
                anyhow::bail!("No user-added event with id {}", id);
            }
        }
    }
    Ok(())
}
