use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::CoinCapConfig;
use crate::error::SourceError;
use crate::model::{Asset, HistoryWindow, Page, PriceHistoryPoint};
use crate::source::MarketSource;

const SOURCE_NAME: &str = "coincap";

/// Every CoinCap response wraps its payload as `{ "data": ..., "timestamp": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[allow(dead_code)]
    #[serde(default)]
    timestamp: Option<i64>,
}

pub struct CoinCapSource {
    client: reqwest::Client,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl CoinCapSource {
    pub fn new(config: &CoinCapConfig) -> Result<Self, Report<SourceError>> {
        let base_url = Url::parse(&config.base_url)
            .change_context_lazy(connection_error)
            .attach_with(|| format!("base_url: {}", config.base_url))?;

        let client = reqwest::Client::builder()
            .default_headers(default_headers(config.api_key.as_deref())?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .change_context_lazy(connection_error)?;

        let per_second =
            NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(5u32));

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }

    /// Fixture assets for working without network access.
    pub fn mock_assets() -> Vec<Asset> {
        vec![
            mock_asset(
                "bitcoin",
                "1",
                "BTC",
                "Bitcoin",
                ("19000000", Some("21000000")),
                ("1000000000000", "30000000000"),
                ("52000", "2.5", "51500"),
                "https://blockchain.info/",
            ),
            mock_asset(
                "ethereum",
                "2",
                "ETH",
                "Ethereum",
                ("120000000", None),
                ("400000000000", "20000000000"),
                ("3100", "-0.8", "3150"),
                "https://etherscan.io/",
            ),
            mock_asset(
                "solana",
                "4",
                "SOL",
                "Solana",
                ("555000000", None),
                ("60000000000", "5000000000"),
                ("110", "3.2", "108"),
                "https://explorer.solana.com/",
            ),
        ]
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET `url` and unwrap the envelope; `Ok(None)` on 404.
    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Option<T>, Report<SourceError>> {
        // Wait for rate limiter before making the request
        self.rate_limiter.until_ready().await;

        debug!(url = %url, ?query, "coincap request");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .change_context_lazy(request_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(Report::new(request_error())
                .attach(format!("HTTP status: {}", response.status())));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .change_context(SourceError::ResponseParse {
                source_name: SOURCE_NAME.into(),
            })?;

        Ok(Some(envelope.data))
    }
}

impl MarketSource for CoinCapSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn list_assets(&self, page: Page) -> BoxFuture<'_, Result<Vec<Asset>, Report<SourceError>>> {
        Box::pin(async move {
            let url = self.url(&["assets"]);
            let assets: Vec<Asset> = self
                .get(url, &page_query(page))
                .await?
                .ok_or_else(|| {
                    Report::new(request_error()).attach("HTTP status: 404 Not Found")
                })?;

            info!(
                page = page.number,
                limit = page.limit,
                fetched = assets.len(),
                "coincap asset list fetched"
            );
            Ok(assets)
        })
    }

    fn asset(&self, id: &str) -> BoxFuture<'_, Result<Option<Asset>, Report<SourceError>>> {
        let id = id.to_owned();
        Box::pin(async move {
            let url = self.url(&["assets", id.as_str()]);
            let asset: Option<Asset> = self.get(url, &[]).await?;
            info!(id = %id, found = asset.is_some(), "coincap asset fetched");
            Ok(asset)
        })
    }

    fn history(
        &self,
        id: &str,
        window: HistoryWindow,
    ) -> BoxFuture<'_, Result<Vec<PriceHistoryPoint>, Report<SourceError>>> {
        let id = id.to_owned();
        Box::pin(async move {
            let url = self.url(&["assets", id.as_str(), "history"]);
            let history: Vec<PriceHistoryPoint> = self
                .get(url, &history_query(window))
                .await?
                .ok_or_else(|| Report::new(SourceError::NotFound { id: id.clone() }))?;

            info!(
                id = %id,
                interval = %window.interval,
                fetched = history.len(),
                "coincap history fetched"
            );
            Ok(history)
        })
    }
}

fn connection_error() -> SourceError {
    SourceError::Connection {
        source_name: SOURCE_NAME.into(),
    }
}

fn request_error() -> SourceError {
    SourceError::Request {
        source_name: SOURCE_NAME.into(),
    }
}

fn default_headers(api_key: Option<&str>) -> Result<HeaderMap, Report<SourceError>> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(key) = api_key.filter(|key| !key.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
            .change_context_lazy(connection_error)
            .attach("api_key contains characters not allowed in a header")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn page_query(page: Page) -> Vec<(&'static str, String)> {
    vec![
        ("limit", page.limit.to_string()),
        ("offset", page.offset().to_string()),
    ]
}

fn history_query(window: HistoryWindow) -> Vec<(&'static str, String)> {
    let mut query = vec![("interval", window.interval.as_str().to_owned())];
    if let Some(start) = window.start {
        query.push(("start", start.to_string()));
    }
    if let Some(end) = window.end {
        query.push(("end", end.to_string()));
    }
    query
}

#[allow(clippy::too_many_arguments)]
fn mock_asset(
    id: &str,
    rank: &str,
    symbol: &str,
    name: &str,
    (supply, max_supply): (&str, Option<&str>),
    (market_cap_usd, volume_usd_24hr): (&str, &str),
    (price_usd, change_percent_24hr, vwap_24hr): (&str, &str, &str),
    explorer: &str,
) -> Asset {
    Asset {
        id: id.into(),
        rank: rank.into(),
        symbol: symbol.into(),
        name: name.into(),
        supply: supply.into(),
        max_supply: max_supply.map(Into::into),
        market_cap_usd: market_cap_usd.into(),
        volume_usd_24hr: volume_usd_24hr.into(),
        price_usd: price_usd.into(),
        change_percent_24hr: change_percent_24hr.into(),
        vwap_24hr: Some(vwap_24hr.into()),
        explorer: Some(explorer.into()),
    }
}
