use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::cities::{CityListing, parse_city_options};
use crate::commodities::{CityPage, city_url, parse_city_page};
use crate::config::ScraperConfig;
use crate::fetch::{PageFetcher, robots_allows};
use crate::history::expand_history;
use crate::models::{CityRef, PriceRecord};
use crate::store::MandiStore;
use crate::writer::{StoreSummary, replace_prices};

/// How a scrape run ended. Informational only; every path has already been logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    RobotsDisallowed,
    NoCities,
    NoRecords,
    Stored(StoreSummary),
    StoreFailed,
}

/// Drives one full scrape: cities, then each city's commodities and histories, then the store.
pub struct MandiScraper {
    cfg: ScraperConfig,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn MandiStore>,
}

impl MandiScraper {
    pub fn new(
        cfg: ScraperConfig,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn MandiStore>,
    ) -> Self {
        Self {
            cfg,
            fetcher,
            store,
        }
    }

    pub async fn run(&self) -> RunOutcome {
        info!("starting data scraping");

        if self.cfg.respect_robots
            && !robots_allows(
                self.fetcher.as_ref(),
                &self.cfg.user_agent,
                &self.cfg.state_url,
            )
            .await
        {
            warn!(url = %self.cfg.state_url, "robots.txt disallows the state page, aborting run");
            return RunOutcome::RobotsDisallowed;
        }

        let cities = self.fetch_cities().await;
        if cities.is_empty() {
            error!("no cities found to scrape");
            return RunOutcome::NoCities;
        }
        info!(count = cities.len(), "found cities to scrape");

        let mut records = Vec::new();
        for (i, city) in cities.iter().enumerate() {
            info!(city = %city.name, "processing city {}/{}", i + 1, cities.len());
            records.extend(self.scrape_city(city).await);
            sleep(self.cfg.city_delay).await;
        }

        if records.is_empty() {
            warn!("no data to store");
            return RunOutcome::NoRecords;
        }

        let outcome = match replace_prices(self.store.as_ref(), &records, self.cfg.batch_size).await
        {
            Ok(summary) => RunOutcome::Stored(summary),
            Err(e) => {
                error!(error = %e, "storing scraped data failed");
                RunOutcome::StoreFailed
            }
        };
        info!("data scraping and storage completed");
        outcome
    }

    async fn fetch_cities(&self) -> Vec<CityRef> {
        let html = match self.fetcher.fetch(&self.cfg.state_url).await {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "error fetching city options");
                return Vec::new();
            }
        };

        match parse_city_options(&html) {
            CityListing::Found(cities) => cities,
            CityListing::SelectorMissing => {
                error!("city dropdown not found");
                Vec::new()
            }
        }
    }

    async fn scrape_city(&self, city: &CityRef) -> Vec<PriceRecord> {
        let url = match city_url(&self.cfg.base_url, city) {
            Ok(u) => u,
            Err(e) => {
                error!(city = %city.name, error = %e, "cannot build city url");
                return Vec::new();
            }
        };

        info!(city = %city.name, %url, "fetching city data");
        let html = match self.fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                error!(city = %city.name, error = %e, "error fetching city data");
                return Vec::new();
            }
        };

        let details = match parse_city_page(&html, &city.name, &self.cfg.base_url) {
            CityPage::Table(details) => details,
            CityPage::NoTable => {
                warn!(city = %city.name, "no data table found");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(details.len());
        for detail in details {
            records.extend(expand_history(self.fetcher.as_ref(), detail).await);
        }
        records
    }
}
