use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use super::{MandiStore, PriceQuery};
use crate::error::StoreError;
use crate::models::{City, Commodity, NewCity, NewCommodity, PriceData, PriceRecord};

type Rejector = Box<dyn Fn(&PriceRecord) -> bool + Send + Sync>;

#[derive(Default)]
struct Tables {
    next_id: i64,
    cities: Vec<City>,
    commodities: Vec<Commodity>,
    prices: Vec<PriceData>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process stand-in for Postgres. A batch containing a rejected row fails as a whole,
/// like a single multi-row INSERT would.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    reject: Option<Rejector>,
    batch_calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn rejecting(reject: impl Fn(&PriceRecord) -> bool + Send + Sync + 'static) -> Self {
        Self {
            reject: Some(Box::new(reject)),
            ..Self::default()
        }
    }

    pub fn prices(&self) -> Vec<PriceData> {
        self.tables.lock().unwrap().prices.clone()
    }

    pub fn cities(&self) -> Vec<City> {
        self.tables.lock().unwrap().cities.clone()
    }

    pub fn commodities(&self) -> Vec<Commodity> {
        self.tables.lock().unwrap().commodities.clone()
    }

    pub fn batch_calls(&self) -> usize {
        *self.batch_calls.lock().unwrap()
    }

    fn check(&self, record: &PriceRecord) -> Result<(), StoreError> {
        match &self.reject {
            Some(reject) if reject(record) => Err(StoreError::Rejected(format!(
                "{} in {}",
                record.commodity, record.city
            ))),
            _ => Ok(()),
        }
    }

    fn push_price(tables: &mut Tables, r: &PriceRecord) {
        let now = Utc::now();
        let id = tables.id();
        tables.prices.push(PriceData {
            id,
            city: r.city.clone(),
            date: r.date.clone(),
            commodity: r.commodity.clone(),
            variety: Some(r.variety.clone()),
            min_price: r.min_price.clone(),
            max_price: r.max_price.clone(),
            modal_price: Some(r.modal_price.clone()),
            price_range: Some(r.price_range.clone()),
            mandi: None,
            district: None,
            state: None,
            created_at: now,
            updated_at: now,
        });
    }
}

#[async_trait]
impl MandiStore for MemoryStore {
    async fn delete_all_prices(&self) -> Result<u64, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.prices.len();
        t.prices.retain(|p| p.id == 0);
        Ok((before - t.prices.len()) as u64)
    }

    async fn city_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.tables.lock().unwrap().cities.iter().any(|c| c.name == name))
    }

    async fn insert_city(&self, city: &NewCity) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let id = t.id();
        t.cities.push(City {
            id,
            name: city.name.clone(),
            slug: city.slug.clone(),
            value: city.value.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn commodity_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .commodities
            .iter()
            .any(|c| c.name == name))
    }

    async fn insert_commodity(&self, commodity: &NewCommodity) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let id = t.id();
        t.commodities.push(Commodity {
            id,
            name: commodity.name.clone(),
            variety: Some(commodity.variety.clone()),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn insert_prices(&self, records: &[PriceRecord]) -> Result<(), StoreError> {
        *self.batch_calls.lock().unwrap() += 1;
        records.iter().try_for_each(|r| self.check(r))?;
        let mut t = self.tables.lock().unwrap();
        for r in records {
            Self::push_price(&mut t, r);
        }
        Ok(())
    }

    async fn insert_price(&self, record: &PriceRecord) -> Result<(), StoreError> {
        self.check(record)?;
        Self::push_price(&mut self.tables.lock().unwrap(), record);
        Ok(())
    }

    async fn list_prices(&self, query: &PriceQuery) -> Result<Vec<PriceData>, StoreError> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<PriceData> = t
            .prices
            .iter()
            .filter(|p| query.city.as_ref().is_none_or(|c| &p.city == c))
            .filter(|p| query.commodity.as_ref().is_none_or(|c| &p.commodity == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn list_cities(&self) -> Result<Vec<City>, StoreError> {
        Ok(self.cities())
    }

    async fn list_commodities(&self) -> Result<Vec<Commodity>, StoreError> {
        Ok(self.commodities())
    }

    async fn latest_update(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .prices
            .iter()
            .map(|p| p.updated_at)
            .max())
    }
}
