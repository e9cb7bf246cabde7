use std::collections::BTreeSet;
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::models::{NewCity, NewCommodity, PriceRecord};
use crate::store::MandiStore;

/// What one write pass did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub deleted: u64,
    pub cities_added: usize,
    pub commodities_added: usize,
    pub attempted: usize,
    pub inserted: usize,
}

/// Replace the stored price set with `records`.
///
/// Deletes every price row first, then registers unseen cities and commodities, then inserts
/// in batches. A failed batch is retried one record at a time so a single bad row only costs
/// itself. Nothing is rolled back: an error after the delete leaves whatever was inserted so far.
pub async fn replace_prices(
    store: &dyn MandiStore,
    records: &[PriceRecord],
    batch_size: usize,
) -> Result<StoreSummary, StoreError> {
    let mut summary = StoreSummary {
        attempted: records.len(),
        ..StoreSummary::default()
    };

    info!("deleting all existing price data");
    summary.deleted = store.delete_all_prices().await?;

    let cities: BTreeSet<&str> = records.iter().map(|r| r.city.as_str()).collect();
    for name in cities {
        if !store.city_exists(name).await? {
            store.insert_city(&NewCity::from_name(name)).await?;
            summary.cities_added += 1;
        }
    }

    // keyed on (name, variety) here, but existence is checked by name alone
    let commodities: BTreeSet<(&str, &str)> = records
        .iter()
        .map(|r| (r.commodity.as_str(), r.variety.as_str()))
        .collect();
    for (name, variety) in commodities {
        if !store.commodity_exists(name).await? {
            store
                .insert_commodity(&NewCommodity {
                    name: name.to_string(),
                    variety: variety.to_string(),
                })
                .await?;
            summary.commodities_added += 1;
        }
    }

    for batch in records.chunks(batch_size.max(1)) {
        match store.insert_prices(batch).await {
            Ok(()) => {
                summary.inserted += batch.len();
                info!(count = batch.len(), "inserted batch");
            }
            Err(e) => {
                error!(error = %e, count = batch.len(), "batch insert failed, inserting one by one");
                summary.inserted += insert_one_by_one(store, batch).await;
            }
        }
    }

    info!(
        success_count = summary.inserted,
        total = summary.attempted,
        "stored {} out of {} records",
        summary.inserted,
        summary.attempted
    );
    if summary.inserted < summary.attempted {
        warn!(
            dropped = summary.attempted - summary.inserted,
            "some records were not stored"
        );
    }
    Ok(summary)
}

async fn insert_one_by_one(store: &dyn MandiStore, batch: &[PriceRecord]) -> usize {
    let mut stored = 0;
    for record in batch {
        match store.insert_price(record).await {
            Ok(()) => stored += 1,
            Err(e) => error!(
                commodity = %record.commodity,
                city = %record.city,
                error = %e,
                "single record insert failed"
            ),
        }
    }
    stored
}
