//! Chain configuration for the GMX SDK

use crate::constants::MAX_LEVERAGE;
use alloy::primitives::Address;
use std::fmt;
use std::str::FromStr;

/// Ledgers the venue is deployed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Arbitrum,
    Avalanche,
}

impl Chain {
    /// Base URL of the venue's info API for this chain
    pub fn info_api_base(&self) -> &'static str {
        match self {
            Chain::Arbitrum => "https://arbitrum-api.gmxinfra.io",
            Chain::Avalanche => "https://avalanche-api.gmxinfra.io",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Arbitrum => "arbitrum",
            Chain::Avalanche => "avalanche",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arbitrum" => Ok(Chain::Arbitrum),
            "avalanche" => Ok(Chain::Avalanche),
            other => Err(eyre::eyre!("Unknown chain: {other}")),
        }
    }
}

/// Chain configuration: RPC endpoint plus the contract addresses the order
/// pipeline talks to. Constructed once by the caller and passed by
/// reference; there is no process-wide configuration state.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain: Chain,
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// ExchangeRouter: entry point for order multicalls
    pub exchange_router: Address,
    /// Router: the spender approved to move collateral into the vault
    pub synthetics_router: Address,
    /// DataStore: on-chain configuration registry (gas-limit table)
    pub datastore: Address,
    /// OrderVault: escrow that receives execution fee and collateral
    pub order_vault: Address,
    /// Wrapped native token (WETH on Arbitrum)
    pub wrapped_native: Address,
    /// Venue leverage cap enforced at resolution time
    pub max_leverage: f64,
}

impl ChainConfig {
    /// Arbitrum One mainnet configuration. Reads the RPC endpoint from the
    /// `ARBITRUM_RPC_URL` environment variable.
    pub fn arbitrum() -> Self {
        let rpc_url = std::env::var("ARBITRUM_RPC_URL")
            .expect("ARBITRUM_RPC_URL environment variable must be set");
        Self::arbitrum_with_rpc(rpc_url)
    }

    /// Arbitrum One mainnet configuration with an explicit RPC endpoint
    pub fn arbitrum_with_rpc(rpc_url: impl Into<String>) -> Self {
        Self {
            chain: Chain::Arbitrum,
            chain_id: 42161,
            rpc_url: rpc_url.into(),
            exchange_router: "0x900173A66dbD345006C51fA35fA3aB760FcD843b"
                .parse()
                .unwrap(),
            synthetics_router: "0x7452c558d45f8afC8c83dAe62C3f8A5BE19c71f6"
                .parse()
                .unwrap(),
            datastore: "0xFD70de6b91282D8017aA4E741e9Ae325CAb992d8"
                .parse()
                .unwrap(),
            order_vault: "0x31eF83a530Fde1B38EE9A18093A333D8Bbbc40D5"
                .parse()
                .unwrap(),
            wrapped_native: "0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"
                .parse()
                .unwrap(),
            max_leverage: MAX_LEVERAGE,
        }
    }

    /// Override the RPC endpoint
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Override the venue leverage cap
    pub fn with_max_leverage(mut self, max_leverage: f64) -> Self {
        self.max_leverage = max_leverage;
        self
    }
}
