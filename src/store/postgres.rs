use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    PgPool, Postgres, QueryBuilder,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{str::FromStr, time::Duration};
use tracing::{info, instrument};

use super::{MandiStore, PriceQuery};
use crate::error::StoreError;
use crate::models::{City, Commodity, NewCity, NewCommodity, PriceData, PriceRecord};

const PRICE_COLUMNS: &str = "id, city, date, commodity, variety, min_price, max_price, \
     modal_price, price_range, mandi, district, state, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    // never put the DSN in a span, it carries credentials
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = PgConnectOptions::from_str(database_url)?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await?;
        info!("connected to db");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MandiStore for PgStore {
    async fn delete_all_prices(&self) -> Result<u64, StoreError> {
        let done = sqlx::query("DELETE FROM price_data WHERE id <> 0")
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn city_exists(&self, name: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM cities WHERE name = $1 LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_city(&self, city: &NewCity) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO cities (name, slug, value) VALUES ($1, $2, $3)")
            .bind(&city.name)
            .bind(&city.slug)
            .bind(&city.value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn commodity_exists(&self, name: &str) -> Result<bool, StoreError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM commodities WHERE name = $1 LIMIT 1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn insert_commodity(&self, commodity: &NewCommodity) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO commodities (name, variety) VALUES ($1, $2)")
            .bind(&commodity.name)
            .bind(&commodity.variety)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_prices(&self, records: &[PriceRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO price_data \
             (city, date, commodity, variety, min_price, max_price, modal_price, price_range) ",
        );
        qb.push_values(records, |mut row, r| {
            row.push_bind(r.city.as_str())
                .push_bind(r.date.as_str())
                .push_bind(r.commodity.as_str())
                .push_bind(r.variety.as_str())
                .push_bind(r.min_price.as_str())
                .push_bind(r.max_price.as_str())
                .push_bind(r.modal_price.as_str())
                .push_bind(r.price_range.as_str());
        });
        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_price(&self, record: &PriceRecord) -> Result<(), StoreError> {
        self.insert_prices(std::slice::from_ref(record)).await
    }

    async fn list_prices(&self, query: &PriceQuery) -> Result<Vec<PriceData>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {PRICE_COLUMNS} FROM price_data WHERE TRUE"
        ));
        if let Some(city) = &query.city {
            qb.push(" AND city = ").push_bind(city.as_str());
        }
        if let Some(commodity) = &query.commodity {
            qb.push(" AND commodity = ").push_bind(commodity.as_str());
        }
        qb.push(" ORDER BY date DESC, id DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let rows = qb
            .build_query_as::<PriceData>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_cities(&self) -> Result<Vec<City>, StoreError> {
        let rows = sqlx::query_as::<_, City>(
            "SELECT id, name, slug, value, created_at, updated_at FROM cities ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_commodities(&self) -> Result<Vec<Commodity>, StoreError> {
        let rows = sqlx::query_as::<_, Commodity>(
            "SELECT id, name, variety, created_at, updated_at FROM commodities ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn latest_update(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let latest = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT updated_at FROM price_data ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(latest)
    }
}
