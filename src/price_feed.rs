//! Live spot price lookup with a manual fallback.
//!
//! The simulation itself is deterministic; this module only resolves the
//! starting price before a run.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_COIN: &str = "bitcoin";
pub const DEFAULT_VS_CURRENCY: &str = "usd";

const SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PriceFeedError {
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("price response has no {vs} quote for {coin}")]
    MissingQuote { coin: String, vs: String },

    #[error("quoted price {0} is not a positive number")]
    InvalidQuote(f64),

    #[error("manual price {0} is not a positive number")]
    InvalidManualPrice(f64),
}

/// Where the starting price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Live,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price: f64,
    pub source: PriceSource,
}

/// Extract `coin`/`vs` from a simple-price response body of the form
/// `{"bitcoin":{"usd":65000.12}}`.
pub fn parse_spot_price(body: &str, coin: &str, vs: &str) -> Result<f64, PriceFeedError> {
    let json: Value = serde_json::from_str(body)?;
    quote_from_json(&json, coin, vs)
}

fn quote_from_json(json: &Value, coin: &str, vs: &str) -> Result<f64, PriceFeedError> {
    let price = json
        .get(coin)
        .and_then(|quotes| quotes.get(vs))
        .and_then(Value::as_f64)
        .ok_or_else(|| PriceFeedError::MissingQuote {
            coin: coin.to_string(),
            vs: vs.to_string(),
        })?;

    if !price.is_finite() || price <= 0.0 {
        return Err(PriceFeedError::InvalidQuote(price));
    }
    Ok(price)
}

/// Fetch the current spot price from CoinGecko.
pub fn fetch_spot_price(coin: &str, vs: &str) -> Result<f64, PriceFeedError> {
    let url = format!("{}?ids={}&vs_currencies={}", SIMPLE_PRICE_URL, coin, vs);

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let json: Value = client.get(&url).send()?.error_for_status()?.json()?;

    quote_from_json(&json, coin, vs)
}

/// Resolve the starting price: use `fetch` when it succeeds, otherwise
/// fall back to the user-supplied `manual` price.
pub fn resolve_initial_price<F>(fetch: F, manual: f64) -> Result<PriceQuote, PriceFeedError>
where
    F: FnOnce() -> Result<f64, PriceFeedError>,
{
    match fetch() {
        Ok(price) => {
            tracing::info!(price, "using live spot price");
            Ok(PriceQuote {
                price,
                source: PriceSource::Live,
            })
        }
        Err(e) => {
            if !manual.is_finite() || manual <= 0.0 {
                return Err(PriceFeedError::InvalidManualPrice(manual));
            }
            tracing::warn!(error = %e, manual, "live price unavailable, using manual price");
            Ok(PriceQuote {
                price: manual,
                source: PriceSource::Manual,
            })
        }
    }
}
