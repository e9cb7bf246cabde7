use anyhow::{Context, Result};
use std::{env, time::Duration};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Everything the scrape pipeline needs to know about the portal and its pacing.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: Url,
    pub state_url: Url,
    pub user_agent: String,
    pub city_delay: Duration,
    pub batch_size: usize,
    pub request_timeout: Duration,
    pub respect_robots: bool,
}

impl ScraperConfig {
    pub fn new(base_url: Url, state_path: &str) -> Result<Self> {
        let state_url = base_url
            .join(state_path)
            .with_context(|| format!("invalid state path {state_path}"))?;
        Ok(Self {
            base_url,
            state_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            city_delay: Duration::from_secs(1),
            batch_size: 50,
            request_timeout: Duration::from_secs(25),
            respect_robots: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub auto_migrate: bool,
    pub api_host: String,
    pub api_port: u16,
    pub scrape_cron: String,
    pub scraper: ScraperConfig,
}

impl Config {
    /// Load configuration from the environment (and `.env` when present).
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let base_url = env::var("MANDI_BASE_URL")
            .unwrap_or_else(|_| "https://www.mandiman.in".to_string());
        let base_url = Url::parse(&base_url).context("MANDI_BASE_URL must be a valid url")?;
        let state_path =
            env::var("MANDI_STATE_PATH").unwrap_or_else(|_| "/state/jharkhand".to_string());

        let mut scraper = ScraperConfig::new(base_url, &state_path)?;
        scraper.city_delay = Duration::from_millis(parse_var("MANDI_CITY_DELAY_MS", 1000)?);
        scraper.batch_size = parse_var::<usize>("MANDI_BATCH_SIZE", 50)?.max(1);
        scraper.request_timeout = Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 25)?);
        scraper.respect_robots = flag("MANDI_RESPECT_ROBOTS");
        if let Ok(ua) = env::var("MANDI_USER_AGENT") {
            scraper.user_agent = ua;
        }

        let cfg = Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            auto_migrate: flag("AUTO_MIGRATE"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: parse_var("API_PORT", 8000)?,
            scrape_cron: env::var("MANDI_SCRAPE_CRON")
                .unwrap_or_else(|_| "0 7 15 * * *".to_string()),
            scraper,
        };
        info!(
            state_url = %cfg.scraper.state_url,
            cron = %cfg.scrape_cron,
            batch_size = cfg.scraper.batch_size,
            respect_robots = cfg.scraper.respect_robots,
            "configuration loaded"
        );
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}

fn flag(key: &str) -> bool {
    env::var(key).map(|v| is_truthy(&v)).unwrap_or(false)
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
