use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, HeaderMap, HeaderValue, PRAGMA,
    UPGRADE_INSECURE_REQUESTS,
};
use robotstxt::DefaultMatcher;
use tracing::{debug, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::FetchError;

/// Anything that can turn a URL into page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

// -------------------------
// reqwest-backed fetcher
// -------------------------

/// One long-lived client with a fixed browser identity.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(cfg: &ScraperConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .default_headers(base_headers())
            .redirect(reqwest::redirect::Policy::limited(8))
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|source| FetchError::Request {
                url: cfg.base_url.to_string(),
                source,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let request_err = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let rsp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(request_err)?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let text = rsp.text().await.map_err(request_err)?;
        debug!(%url, %status, len = text.len(), "fetched page");
        Ok(text)
    }
}

fn base_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    h.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-IN,en;q=0.9,hi;q=0.8"),
    );
    h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    h.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    h.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    h
}

// -------------------------
// robots.txt
// -------------------------

/// Whether robots.txt on `target`'s origin lets `user_agent` fetch it. Unreachable robots.txt allows all.
pub async fn robots_allows(
    fetcher: &dyn PageFetcher,
    user_agent: &str,
    target: &Url,
) -> bool {
    let robots_url = match target.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            warn!(%target, error = %e, "cannot build robots.txt url");
            return true;
        }
    };

    let robots_txt = match fetcher.fetch(&robots_url).await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "robots.txt unavailable, assuming allow-all");
            String::new()
        }
    };

    let agent = product_token(user_agent);
    let mut matcher = DefaultMatcher::default();
    matcher.one_agent_allowed_by_robots(&robots_txt, agent, target.as_str())
}

/// `MandiBot/1.0 (+contact)` -> `MandiBot`. robots.txt groups name the product only.
fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .find(|s| !s.is_empty())
        .unwrap_or("*")
}
