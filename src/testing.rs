//! Test doubles and markup builders shared by the unit tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::{collections::HashMap, sync::Mutex};
use url::Url;

use crate::error::FetchError;
use crate::fetch::PageFetcher;

/// Serves canned markup by exact URL; anything else is a 404.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            })
    }
}

// -------------------------
// Markup builders
// -------------------------

pub fn state_page(options: &str) -> String {
    format!(
        r#"<html><body>
<select id="redirectDropdown" class="form-select">{options}</select>
</body></html>"#
    )
}

/// A summary row plus its detail row, the way the city page renders one commodity.
pub struct CommodityRow<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub range: &'a str,
    pub cells: Vec<&'a str>,
}

impl<'a> CommodityRow<'a> {
    pub fn new(id: &'a str, label: &'a str, cells: Vec<&'a str>) -> Self {
        Self {
            id,
            label,
            range: "₹2000 - ₹2400",
            cells,
        }
    }

    fn summary(&self) -> String {
        format!(
            r##"<tr class="m_view"><td>
<div class="float-start">{}</div>
<div class="d-inline">{}</div>
<button class="btn" data-bs-toggle="collapse" data-bs-target="#{}">+</button>
</td></tr>"##,
            self.label, self.range, self.id
        )
    }

    fn detail(&self) -> String {
        let cells: String = self.cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!(r#"<tr id="{}" class="collapse">{cells}</tr>"#, self.id)
    }
}

pub fn city_page(rows: &[CommodityRow<'_>]) -> String {
    let body: String = rows
        .iter()
        .map(|r| format!("{}{}", r.summary(), r.detail()))
        .collect();
    format!(
        r#"<html><body><table id="data-table" class="table">
<thead><tr><th>Date</th><th>Commodity</th><th>Variety</th><th>Min</th><th>Max</th><th>Modal</th></tr></thead>
<tbody>{body}</tbody></table></body></html>"#
    )
}

pub fn history_page(rows: &[[&str; 6]]) -> String {
    let body: String = rows
        .iter()
        .map(|r| {
            let cells: String = r.iter().map(|c| format!("<td>{c}</td>")).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!(
        r#"<html><body><table id="data-table">
<tr><th>Date</th><th>Commodity</th><th>Variety</th><th>Min</th><th>Max</th><th>Modal</th></tr>
{body}</table></body></html>"#
    )
}
