use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

use crate::models::{CityRef, DetailRecord, PriceRecord, slugify};

/// Detail rows need date, commodity, variety, min, max and modal cells.
pub const MIN_CELLS: usize = 6;

const MISSING_RANGE: &str = "N/A - N/A";

static DATA_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#data-table").unwrap());
static SUMMARY_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr.m_view").unwrap());
static LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.float-start").unwrap());
static RANGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.d-inline").unwrap());
static TOGGLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

#[derive(Debug, PartialEq, Eq)]
pub enum CityPage {
    Table(Vec<DetailRecord>),
    NoTable,
}

/// `/mandi/{slug}` when the dropdown gave a slug, else `/mandi/{value}/{slugified name}`.
pub fn city_url(base: &Url, city: &CityRef) -> Result<Url, url::ParseError> {
    match &city.slug {
        Some(slug) => base.join(&format!("/mandi/{slug}")),
        None => base.join(&format!("/mandi/{}/{}", city.value, slugify(&city.name))),
    }
}

/// Pair every summary row of the city table with its detail row and read one record per commodity.
pub fn parse_city_page(html: &str, city: &str, base: &Url) -> CityPage {
    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&DATA_TABLE).next() else {
        return CityPage::NoTable;
    };

    // detail rows are siblings anywhere in the document, not children of the summary
    let mut details: HashMap<&str, ElementRef<'_>> = HashMap::new();
    for tr in doc.select(&ROW) {
        if let Some(id) = tr.value().id() {
            details.entry(id).or_insert(tr);
        }
    }

    let records = table
        .select(&SUMMARY_ROW)
        .filter_map(|summary| {
            let label = text_of(summary.select(&LABEL).next()?);
            let range = summary
                .select(&RANGE)
                .next()
                .map(text_of)
                .unwrap_or_else(|| MISSING_RANGE.to_string());

            let target = summary.select(&TOGGLE).next()?.value().attr("data-bs-target")?;
            let target = target.trim_start_matches('#');
            if target.is_empty() {
                return None;
            }

            let detail = *details.get(target)?;
            read_detail_row(detail, city, &label, &range, base)
        })
        .collect();

    CityPage::Table(records)
}

fn read_detail_row(
    row: ElementRef<'_>,
    city: &str,
    summary_label: &str,
    range: &str,
    base: &Url,
) -> Option<DetailRecord> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    if cells.len() < MIN_CELLS {
        return None;
    }

    let commodity = match text_of(cells[1]) {
        c if c.is_empty() => summary_label.to_string(),
        c => c,
    };

    let history_url = cells[1]
        .select(&LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base.join(href).ok());

    Some(DetailRecord {
        record: PriceRecord {
            city: city.to_string(),
            date: text_of(cells[0]),
            commodity,
            variety: text_of(cells[2]),
            min_price: text_of(cells[3]),
            max_price: text_of(cells[4]),
            modal_price: text_of(cells[5]),
            price_range: range.to_string(),
        },
        history_url,
    })
}

pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
