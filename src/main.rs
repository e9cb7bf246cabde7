use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use mandi::api::{self, AppState};
use mandi::config::Config;
use mandi::fetch::HttpFetcher;
use mandi::pipeline::MandiScraper;
use mandi::scheduler::ScrapeScheduler;
use mandi::store::PgStore;
use mandi::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // .env may carry RUST_LOG, so load it before the subscriber reads the filter
    dotenvy::dotenv().ok();
    init_tracing("info,mandi=debug")?;
    let cfg = Config::from_env()?;

    let store = Arc::new(
        PgStore::connect(&cfg.database_url, cfg.db_max_connections)
            .await
            .context("failed to connect to database")?,
    );
    if cfg.auto_migrate {
        store.migrate().await?;
    }

    let fetcher = Arc::new(HttpFetcher::new(&cfg.scraper)?);
    let scraper = Arc::new(MandiScraper::new(
        cfg.scraper.clone(),
        fetcher,
        store.clone(),
    ));

    let scheduler = ScrapeScheduler::start(scraper.clone(), &cfg.scrape_cron).await?;

    let state = web::Data::new(AppState {
        store: store.clone(),
        scraper,
    });

    info!(host = %cfg.api_host, port = cfg.api_port, "starting mandi api");
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::routes)
    })
    .bind((cfg.api_host.as_str(), cfg.api_port))?
    .run()
    .await?;

    scheduler.shutdown().await?;
    store.close().await;
    info!("shut down cleanly");
    Ok(())
}
