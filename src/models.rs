use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

// -------------------------
// Scrape-side records
// -------------------------

/// A city as listed in the state page's dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityRef {
    pub name: String,
    /// `data-slug` attribute; preferred for routing when present.
    pub slug: Option<String>,
    pub value: String,
}

/// One price observation. Prices stay display strings, "N/A" included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub city: String,
    pub date: String,
    pub commodity: String,
    pub variety: String,
    pub min_price: String,
    pub max_price: String,
    pub modal_price: String,
    pub price_range: String,
}

/// A record pulled from a detail row, with the commodity's history page if it links one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    pub record: PriceRecord,
    pub history_url: Option<Url>,
}

/// `"{min} - {max}"` when both bounds are present, otherwise `"N/A"`.
pub fn price_range(min: &str, max: &str) -> String {
    if min.is_empty() || max.is_empty() {
        "N/A".to_string()
    } else {
        format!("{min} - {max}")
    }
}

/// Lowercase, spaces to hyphens. Used for derived city slugs and fallback URLs.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

// -------------------------
// Persisted rows
// -------------------------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Commodity {
    pub id: i64,
    pub name: String,
    pub variety: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriceData {
    pub id: i64,
    pub city: String,
    pub date: String,
    pub commodity: String,
    pub variety: Option<String>,
    pub min_price: String,
    pub max_price: String,
    pub modal_price: Option<String>,
    pub price_range: Option<String>,
    pub mandi: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCity {
    pub name: String,
    pub slug: String,
    pub value: String,
}

impl NewCity {
    /// Cities discovered only through price rows get slug and value from the name.
    pub fn from_name(name: &str) -> Self {
        let slug = slugify(name);
        Self {
            name: name.to_string(),
            value: slug.clone(),
            slug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommodity {
    pub name: String,
    pub variety: String,
}
