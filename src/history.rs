use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::commodities::text_of;
use crate::fetch::PageFetcher;
use crate::models::{DetailRecord, PriceRecord, price_range};

static DATA_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#data-table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

#[derive(Debug, PartialEq, Eq)]
pub enum HistoryPage {
    Rows(Vec<PriceRecord>),
    NoTable,
}

impl HistoryPage {
    /// History rows when there are any, else just the current-day record.
    pub fn or_current(self, current: PriceRecord) -> Vec<PriceRecord> {
        match self {
            HistoryPage::Rows(rows) if !rows.is_empty() => rows,
            _ => vec![current],
        }
    }
}

/// Read a commodity history table. Every row is attributed to `city`.
pub fn parse_history_page(html: &str, city: &str) -> HistoryPage {
    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&DATA_TABLE).next() else {
        return HistoryPage::NoTable;
    };

    let rows = table
        .select(&ROW)
        .filter(|row| !is_header(*row) && !is_mobile_view(*row))
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(text_of).collect();
            let [date, commodity, variety, min_price, max_price, modal_price, ..] =
                cells.as_slice()
            else {
                return None;
            };
            Some(PriceRecord {
                city: city.to_string(),
                date: date.clone(),
                commodity: commodity.clone(),
                variety: variety.clone(),
                min_price: min_price.clone(),
                max_price: max_price.clone(),
                modal_price: modal_price.clone(),
                price_range: price_range(min_price, max_price),
            })
        })
        .collect();

    HistoryPage::Rows(rows)
}

fn is_header(row: ElementRef<'_>) -> bool {
    row.select(&HEADER_CELL).next().is_some()
}

fn is_mobile_view(row: ElementRef<'_>) -> bool {
    row.value().classes().any(|c| c == "m_view")
}

/// Swap a detail record for its history rows when it links a history page that has any.
pub async fn expand_history(fetcher: &dyn PageFetcher, detail: DetailRecord) -> Vec<PriceRecord> {
    let DetailRecord {
        record,
        history_url,
    } = detail;
    let Some(url) = history_url else {
        return vec![record];
    };

    info!(%url, commodity = %record.commodity, "fetching history");
    let html = match fetcher.fetch(&url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "history fetch failed, keeping current record");
            return vec![record];
        }
    };

    let page = parse_history_page(&html, &record.city);
    page.or_current(record)
}
