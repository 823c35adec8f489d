//! Token and market registries fetched from the venue's info API

use crate::config::Chain;
use alloy::primitives::{address, Address};
use eyre::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Bridged BTC on Arbitrum (WBTC.b), the ERC-20 actually held and approved
pub const BRIDGED_BTC: Address = address!("0x2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f");

/// Synthetic BTC index address the market registry is keyed by
pub const SYNTHETIC_BTC: Address = address!("0x47904963fc8b2340414262125aF798B9655E58Cd");

/// Compatibility shim: callers say "BTC", the token registry lists the
/// bridged token as "WBTC.b". One entry, on purpose; do not generalize.
const SYMBOL_ALIASES: [(&str, &str); 1] = [("BTC", "WBTC.b")];

/// Compatibility shim mirroring the symbol alias: the BTC market is keyed by
/// the synthetic index address, while the bridged token address is what the
/// token registry (and user-facing fields) carry. One entry, on purpose.
fn market_lookup_alias(index_token: Address) -> Address {
    if index_token == BRIDGED_BTC {
        SYNTHETIC_BTC
    } else {
        index_token
    }
}

fn resolve_symbol_alias(symbol: &str) -> &str {
    SYMBOL_ALIASES
        .iter()
        .find(|(from, _)| *from == symbol)
        .map(|(_, to)| *to)
        .unwrap_or(symbol)
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("GmxRustSdk/0.1.0")
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

/// Token metadata from the info API
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    #[serde(default)]
    pub synthetic: bool,
}

#[derive(Debug, Deserialize)]
struct TokensResponse {
    tokens: Vec<TokenInfo>,
}

/// Address-keyed token registry for one chain
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    by_address: HashMap<Address, TokenInfo>,
}

impl TokenRegistry {
    /// Fetch the current token list from the info API
    pub async fn fetch(chain: Chain) -> Result<Self> {
        let url = format!("{}/tokens", chain.info_api_base());
        let response = http_client()?
            .get(&url)
            .send()
            .await
            .context("Failed to fetch token registry")?;
        let tokens: TokensResponse = response
            .json()
            .await
            .context("Failed to parse token registry")?;
        Ok(Self::from_tokens(tokens.tokens))
    }

    /// Build a registry from an in-memory token list
    pub fn from_tokens(tokens: Vec<TokenInfo>) -> Self {
        Self {
            by_address: tokens.into_iter().map(|t| (t.address, t)).collect(),
        }
    }

    pub fn by_address(&self, address: Address) -> Option<&TokenInfo> {
        self.by_address.get(&address)
    }

    /// Look up a token by symbol, with the BTC alias applied first
    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        let symbol = resolve_symbol_alias(symbol);
        self.by_address.values().find(|t| t.symbol == symbol)
    }

    pub fn decimals(&self, address: Address) -> Option<u8> {
        self.by_address.get(&address).map(|t| t.decimals)
    }
}

/// Market metadata from the info API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfo {
    /// Market token address; doubles as the market key
    pub market_token: Address,
    pub index_token: Address,
    pub long_token: Address,
    pub short_token: Address,
}

#[derive(Debug, Deserialize)]
struct MarketsResponse {
    markets: Vec<MarketInfo>,
}

/// Market registry for one chain
#[derive(Debug, Clone)]
pub struct MarketRegistry {
    markets: Vec<MarketInfo>,
}

impl MarketRegistry {
    /// Fetch the current market list from the info API
    pub async fn fetch(chain: Chain) -> Result<Self> {
        let url = format!("{}/markets", chain.info_api_base());
        let response = http_client()?
            .get(&url)
            .send()
            .await
            .context("Failed to fetch market registry")?;
        let markets: MarketsResponse = response
            .json()
            .await
            .context("Failed to parse market registry")?;
        Ok(Self::from_markets(markets.markets))
    }

    /// Build a registry from an in-memory market list
    pub fn from_markets(markets: Vec<MarketInfo>) -> Self {
        Self { markets }
    }

    /// The market trading a given index token, with the synthetic-BTC lookup
    /// substitution applied first
    pub fn market_for_index(&self, index_token: Address) -> Option<&MarketInfo> {
        let key = market_lookup_alias(index_token);
        self.markets.iter().find(|m| m.index_token == key)
    }

    /// A single market whose long/short tokens cover both addresses, if one
    /// exists; used for single-hop swap path derivation
    pub fn direct_swap_market(&self, a: Address, b: Address) -> Option<&MarketInfo> {
        self.markets.iter().find(|m| {
            let pool = [m.long_token, m.short_token];
            pool.contains(&a) && pool.contains(&b)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC: Address = address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831");
    const BTC_MARKET: Address = address!("0x47c031236e19d024b42f8AE6780E44A573170703");

    fn tokens() -> TokenRegistry {
        TokenRegistry::from_tokens(vec![
            TokenInfo {
                symbol: "WBTC.b".into(),
                address: BRIDGED_BTC,
                decimals: 8,
                synthetic: false,
            },
            TokenInfo {
                symbol: "USDC".into(),
                address: USDC,
                decimals: 6,
                synthetic: false,
            },
        ])
    }

    fn markets() -> MarketRegistry {
        MarketRegistry::from_markets(vec![MarketInfo {
            market_token: BTC_MARKET,
            index_token: SYNTHETIC_BTC,
            long_token: BRIDGED_BTC,
            short_token: USDC,
        }])
    }

    #[test]
    fn test_btc_symbol_alias() {
        let registry = tokens();
        let token = registry.by_symbol("BTC").expect("alias should resolve");
        assert_eq!(token.address, BRIDGED_BTC);
        assert_eq!(token.decimals, 8);
        // the literal listing still works
        assert_eq!(registry.by_symbol("WBTC.b").unwrap().address, BRIDGED_BTC);
    }

    #[test]
    fn test_market_lookup_substitution() {
        let registry = markets();
        // the bridged address is substituted for the synthetic key
        let market = registry
            .market_for_index(BRIDGED_BTC)
            .expect("substituted lookup should find the BTC market");
        assert_eq!(market.market_token, BTC_MARKET);
        // the synthetic key itself also resolves
        assert!(registry.market_for_index(SYNTHETIC_BTC).is_some());
        // an unknown index does not
        assert!(registry.market_for_index(USDC).is_none());
    }

    #[test]
    fn test_direct_swap_market() {
        let registry = markets();
        assert!(registry.direct_swap_market(BRIDGED_BTC, USDC).is_some());
        assert!(registry.direct_swap_market(USDC, BRIDGED_BTC).is_some());
        assert!(registry
            .direct_swap_market(USDC, SYNTHETIC_BTC)
            .is_none());
    }

    #[test]
    fn test_token_registry_parses_api_shape() {
        let body = r#"{"tokens":[
            {"symbol":"WBTC.b","address":"0x2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f","decimals":8},
            {"symbol":"BTC","address":"0x47904963fc8b2340414262125aF798B9655E58Cd","decimals":8,"synthetic":true}
        ]}"#;
        let parsed: TokensResponse = serde_json::from_str(body).unwrap();
        let registry = TokenRegistry::from_tokens(parsed.tokens);
        assert!(registry.by_address(SYNTHETIC_BTC).unwrap().synthetic);
        assert_eq!(registry.decimals(BRIDGED_BTC), Some(8));
    }
}
