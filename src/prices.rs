// src/prices.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unreadable price data for {ticker}: {reason}")]
    Parse { ticker: String, reason: String },

    #[error("no price available for {0}")]
    Unavailable(String),
}

/// Source of the latest trading price for a ticker.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn current_price(&self, ticker: &str) -> Result<f64, PriceError>;
}

/// Alpha Vantage when a key is configured, otherwise a feed that knows no prices.
pub fn from_config(config: &Config, client: Client) -> Box<dyn PriceFeed> {
    match &config.alpha_vantage_key {
        Some(key) => Box::new(AlphaVantageFeed::new(client, key.clone())),
        None => {
            info!("ALPHA_VANTAGE_API_KEY not set, current prices will show as zero");
            Box::new(FixedPriceFeed::default())
        }
    }
}

#[derive(Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

#[derive(Deserialize)]
struct AlphaVantageResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: HashMap<String, DailyBar>,
}

/// Close of the most recent trading day in a `TIME_SERIES_DAILY` payload.
fn latest_close(ticker: &str, body: &str) -> Result<f64, PriceError> {
    let parse_error = |reason: String| PriceError::Parse {
        ticker: ticker.to_string(),
        reason,
    };

    let response: AlphaVantageResponse =
        serde_json::from_str(body).map_err(|e| parse_error(e.to_string()))?;

    let (date, bar) = response
        .time_series
        .iter()
        .filter_map(|(day, bar)| {
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .ok()
                .map(|date| (date, bar))
        })
        .max_by_key(|(date, _)| *date)
        .ok_or_else(|| PriceError::Unavailable(ticker.to_string()))?;

    let close = bar
        .close
        .parse::<f64>()
        .map_err(|e| parse_error(format!("close on {}: {}", date, e)))?;
    debug!("{} closed at {} on {}", ticker, close, date);
    Ok(close)
}

pub struct AlphaVantageFeed {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageFeed {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        AlphaVantageFeed {
            client,
            api_key: api_key.into(),
            base_url: ALPHA_VANTAGE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PriceFeed for AlphaVantageFeed {
    async fn current_price(&self, ticker: &str) -> Result<f64, PriceError> {
        let body = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        latest_close(ticker, &body)
    }
}

/// Prices known up front. Unknown tickers are unavailable.
#[derive(Debug, Clone, Default)]
pub struct FixedPriceFeed {
    prices: HashMap<String, f64>,
}

impl FixedPriceFeed {
    pub fn new<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        FixedPriceFeed {
            prices: prices.into_iter().map(|(t, p)| (t.into(), p)).collect(),
        }
    }
}

#[async_trait]
impl PriceFeed for FixedPriceFeed {
    async fn current_price(&self, ticker: &str) -> Result<f64, PriceError> {
        self.prices
            .get(ticker)
            .copied()
            .ok_or_else(|| PriceError::Unavailable(ticker.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = r#"{
        "Meta Data": {"2. Symbol": "IBM"},
        "Time Series (Daily)": {
            "2024-05-01": {"1. open": "1.0", "4. close": "165.20", "5. volume": "10"},
            "2024-05-03": {"1. open": "1.0", "4. close": "167.50", "5. volume": "10"},
            "2024-05-02": {"1. open": "1.0", "4. close": "166.10", "5. volume": "10"}
        }
    }"#;

    #[test]
    fn picks_most_recent_close() {
        assert_eq!(latest_close("IBM", DAILY).unwrap(), 167.50);
    }

    #[test]
    fn rate_limit_note_is_a_parse_error() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage!"}"#;
        assert!(matches!(
            latest_close("IBM", body),
            Err(PriceError::Parse { .. })
        ));
    }

    #[test]
    fn empty_series_is_unavailable() {
        let body = r#"{"Time Series (Daily)": {}}"#;
        assert!(matches!(
            latest_close("IBM", body),
            Err(PriceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn fixed_feed_knows_only_its_tickers() {
        let feed = FixedPriceFeed::new([("AAPL", 190.0)]);
        assert_eq!(feed.current_price("AAPL").await.unwrap(), 190.0);
        assert!(feed.current_price("MSFT").await.is_err());
    }
}
