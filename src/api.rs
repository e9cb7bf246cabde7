use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::pipeline::MandiScraper;
use crate::store::{MandiStore, PriceQuery};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

pub struct AppState {
    pub store: Arc<dyn MandiStore>,
    pub scraper: Arc<MandiScraper>,
}

// -------------------------
// Request types
// -------------------------

#[derive(Deserialize)]
pub struct PageParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PageParams {
    fn query(&self, city: Option<String>, commodity: Option<String>) -> PriceQuery {
        PriceQuery {
            city,
            commodity,
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

fn store_error(context: &str, e: impl std::fmt::Display) -> HttpResponse {
    error!(error = %e, "{context}");
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": format!("{context}: {e}") }))
}

// -------------------------
// HTTP Handlers
// -------------------------

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Mandi Data API for Jharkhand",
        "status": "active",
    }))
}

#[get("/healthz")]
async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

async fn list_prices(state: &AppState, query: PriceQuery, context: &str) -> HttpResponse {
    match state.store.list_prices(&query).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => store_error(context, e),
    }
}

#[get("/mandi/")]
async fn all_prices(state: web::Data<AppState>, page: web::Query<PageParams>) -> impl Responder {
    list_prices(&state, page.query(None, None), "error fetching data").await
}

#[get("/mandi/{city}")]
async fn city_prices(
    state: web::Data<AppState>,
    path: web::Path<String>,
    page: web::Query<PageParams>,
) -> impl Responder {
    let city = path.into_inner();
    let context = format!("error fetching data for {city}");
    list_prices(&state, page.query(Some(city), None), &context).await
}

#[get("/mandi/{city}/{commodity}")]
async fn city_commodity_prices(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    page: web::Query<PageParams>,
) -> impl Responder {
    let (city, commodity) = path.into_inner();
    let context = format!("error fetching data for {city}/{commodity}");
    list_prices(&state, page.query(Some(city), Some(commodity)), &context).await
}

#[get("/cities")]
async fn cities(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_cities().await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => store_error("error fetching cities", e),
    }
}

#[get("/commodities")]
async fn commodities(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_commodities().await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => store_error("error fetching commodities", e),
    }
}

#[post("/refresh-data")]
async fn refresh_data(state: web::Data<AppState>) -> impl Responder {
    let scraper = state.scraper.clone();
    // no guard against an overlapping scheduled run
    actix_web::rt::spawn(async move {
        let outcome = scraper.run().await;
        info!(?outcome, "manual refresh finished");
    });
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Data refresh started in the background"
    }))
}

#[get("/latest-update")]
async fn latest_update(state: web::Data<AppState>) -> impl Responder {
    match state.store.latest_update().await {
        Ok(ts) => HttpResponse::Ok().json(serde_json::json!({ "latest_update": ts })),
        Err(e) => store_error("error fetching latest update", e),
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(healthz)
        .service(all_prices)
        .service(city_prices)
        .service(city_commodity_prices)
        .service(cities)
        .service(commodities)
        .service(refresh_data)
        .service(latest_update);
}
