use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{City, Commodity, NewCity, NewCommodity, PriceData, PriceRecord};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Filter and page for price listings. Results are always newest date first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceQuery {
    pub city: Option<String>,
    pub commodity: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// The relational store behind both the scrape writer and the read API.
#[async_trait]
pub trait MandiStore: Send + Sync {
    /// Remove every price row. Returns how many went.
    async fn delete_all_prices(&self) -> Result<u64, StoreError>;

    async fn city_exists(&self, name: &str) -> Result<bool, StoreError>;
    async fn insert_city(&self, city: &NewCity) -> Result<(), StoreError>;

    /// Looks up by name only; variety is not considered.
    async fn commodity_exists(&self, name: &str) -> Result<bool, StoreError>;
    async fn insert_commodity(&self, commodity: &NewCommodity) -> Result<(), StoreError>;

    /// All-or-nothing insert of one batch.
    async fn insert_prices(&self, records: &[PriceRecord]) -> Result<(), StoreError>;
    async fn insert_price(&self, record: &PriceRecord) -> Result<(), StoreError>;

    async fn list_prices(&self, query: &PriceQuery) -> Result<Vec<PriceData>, StoreError>;
    async fn list_cities(&self) -> Result<Vec<City>, StoreError>;
    async fn list_commodities(&self) -> Result<Vec<Commodity>, StoreError>;
    async fn latest_update(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}
