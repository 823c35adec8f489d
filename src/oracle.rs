//! Oracle price snapshot from the venue's signed-price feed

use crate::config::Chain;
use crate::error::OrderError;
use alloy::primitives::Address;
use eyre::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Raw bid/ask pair for one token at the feed scale (USD per smallest token
/// unit, 30 implied decimals)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub min: f64,
    pub max: f64,
}

impl PriceQuote {
    /// Midpoint of bid and ask
    pub fn median(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedPrice {
    token_address: Address,
    min_price_full: String,
    max_price_full: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedPricesResponse {
    signed_prices: Vec<SignedPrice>,
}

/// Point-in-time view of the oracle feed.
///
/// A snapshot is fetched fresh for each pipeline run; execution prices must
/// reflect the feed at submission time, so snapshots are never cached across
/// runs.
#[derive(Debug, Clone)]
pub struct OracleSnapshot {
    quotes: HashMap<Address, PriceQuote>,
}

impl OracleSnapshot {
    /// Fetch the latest signed prices for a chain
    pub async fn fetch(chain: Chain) -> Result<Self> {
        let url = format!("{}/signed_prices/latest", chain.info_api_base());
        let client = reqwest::Client::builder()
            .user_agent("GmxRustSdk/0.1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        let response = client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch signed prices")?;
        let prices: SignedPricesResponse = response
            .json()
            .await
            .context("Failed to parse signed prices")?;

        let mut quotes = HashMap::with_capacity(prices.signed_prices.len());
        for price in prices.signed_prices {
            let min: f64 = price
                .min_price_full
                .parse()
                .with_context(|| format!("Bad min price for {}", price.token_address))?;
            let max: f64 = price
                .max_price_full
                .parse()
                .with_context(|| format!("Bad max price for {}", price.token_address))?;
            quotes.insert(price.token_address, PriceQuote { min, max });
        }
        Ok(Self { quotes })
    }

    /// Build a snapshot from in-memory quotes
    pub fn from_quotes(quotes: impl IntoIterator<Item = (Address, PriceQuote)>) -> Self {
        Self {
            quotes: quotes.into_iter().collect(),
        }
    }

    /// The quote for a token, or `PriceUnavailable` when the snapshot has no
    /// entry for it
    pub fn quote(&self, token: Address) -> Result<PriceQuote, OrderError> {
        self.quotes
            .get(&token)
            .copied()
            .ok_or(OrderError::PriceUnavailable { token })
    }
}
