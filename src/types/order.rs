//! Order types for the user-facing API

use crate::config::Chain;
use crate::pricing::PriceIntent;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;

/// Order kind tag.
///
/// Carries the two kind-specific behaviors the pipeline needs: the pricing
/// intent handed to the slippage calculator and the gas-limit table entry
/// used for budgeting. Increase and decrease share the rest of the pipeline;
/// swap additionally skips the collateral and leverage checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderKind {
    /// Open or grow a position
    #[default]
    Increase,
    /// Close or shrink a position
    Decrease,
    /// Swap one token for another
    Swap,
}

impl OrderKind {
    /// Pricing intent for the slippage calculator
    pub fn intent(&self) -> PriceIntent {
        match self {
            OrderKind::Increase => PriceIntent::Open,
            OrderKind::Decrease => PriceIntent::Close,
            OrderKind::Swap => PriceIntent::Swap,
        }
    }
}

/// A partially-specified trading intent.
///
/// Only `kind` is mandatory up front; everything else may be left out and
/// derived by the resolver where a derivation exists. Fields that cannot be
/// derived (the chain, the direction) surface as `MissingField` rejections.
#[derive(Debug, Clone, Default)]
pub struct OrderRequest {
    pub kind: OrderKind,
    pub chain: Option<Chain>,
    pub market_key: Option<Address>,
    pub index_token_address: Option<Address>,
    pub index_token_symbol: Option<String>,
    pub start_token_address: Option<Address>,
    pub start_token_symbol: Option<String>,
    pub out_token_address: Option<Address>,
    pub out_token_symbol: Option<String>,
    pub collateral_address: Option<Address>,
    pub swap_path: Option<Vec<Address>>,
    pub is_long: Option<bool>,
    /// Position size change in USD
    pub size_delta_usd: Option<f64>,
    /// Desired leverage; used to imply whichever of size/collateral is absent
    pub leverage: Option<f64>,
    /// Collateral change in whole tokens (human scale)
    pub initial_collateral_delta: Option<f64>,
    /// Tolerated adverse price movement, as a fraction (e.g. 0.003)
    pub slippage_percent: Option<f64>,
}

impl OrderRequest {
    /// Start an increase (open/grow) request
    pub fn increase() -> Self {
        Self {
            kind: OrderKind::Increase,
            ..Default::default()
        }
    }

    /// Start a decrease (close/shrink) request
    pub fn decrease() -> Self {
        Self {
            kind: OrderKind::Decrease,
            ..Default::default()
        }
    }

    /// Start a swap request
    pub fn swap() -> Self {
        Self {
            kind: OrderKind::Swap,
            ..Default::default()
        }
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_market_key(mut self, market_key: Address) -> Self {
        self.market_key = Some(market_key);
        self
    }

    pub fn with_index_token_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.index_token_symbol = Some(symbol.into());
        self
    }

    pub fn with_index_token_address(mut self, address: Address) -> Self {
        self.index_token_address = Some(address);
        self
    }

    pub fn with_start_token_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.start_token_symbol = Some(symbol.into());
        self
    }

    pub fn with_start_token_address(mut self, address: Address) -> Self {
        self.start_token_address = Some(address);
        self
    }

    pub fn with_out_token_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.out_token_symbol = Some(symbol.into());
        self
    }

    pub fn with_out_token_address(mut self, address: Address) -> Self {
        self.out_token_address = Some(address);
        self
    }

    pub fn with_collateral_address(mut self, address: Address) -> Self {
        self.collateral_address = Some(address);
        self
    }

    pub fn with_swap_path(mut self, path: Vec<Address>) -> Self {
        self.swap_path = Some(path);
        self
    }

    pub fn long(mut self) -> Self {
        self.is_long = Some(true);
        self
    }

    pub fn short(mut self) -> Self {
        self.is_long = Some(false);
        self
    }

    pub fn with_size_delta_usd(mut self, size_usd: f64) -> Self {
        self.size_delta_usd = Some(size_usd);
        self
    }

    pub fn with_leverage(mut self, leverage: f64) -> Self {
        self.leverage = Some(leverage);
        self
    }

    pub fn with_initial_collateral_delta(mut self, amount: f64) -> Self {
        self.initial_collateral_delta = Some(amount);
        self
    }

    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage_percent = Some(slippage);
        self
    }
}

/// A completed, validated order: every field required for its kind is
/// populated and the on-chain integer amounts are derived. Not mutated after
/// resolution; each submission consumes one fresh `ResolvedOrder`.
#[derive(Debug, Clone)]
pub struct ResolvedOrder {
    pub kind: OrderKind,
    pub chain: Chain,
    /// Market being traded; present for increase/decrease
    pub market_key: Option<Address>,
    /// Token whose price the position tracks; present for increase/decrease
    pub index_token_address: Option<Address>,
    /// Token the collateral arrives in
    pub start_token_address: Address,
    /// Swap destination; present for swap orders
    pub out_token_address: Option<Address>,
    /// Token backing the position; present for increase/decrease
    pub collateral_address: Option<Address>,
    /// Ordered market hops from start token to collateral/out token
    pub swap_path: Vec<Address>,
    pub is_long: Option<bool>,
    pub size_delta_usd: Option<f64>,
    pub initial_collateral_delta: f64,
    pub slippage_percent: f64,
    /// `size_delta_usd * 10^30`; absent for swap orders
    pub size_delta_scaled: Option<U256>,
    /// `initial_collateral_delta * 10^(token decimals)`
    pub collateral_delta_scaled: U256,
}

/// Submission mode for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    /// Sign and broadcast
    #[default]
    Live,
    /// Run the full pipeline including signing, but never broadcast
    Simulate,
}

/// A fully-specified transaction payload, ready for signing.
///
/// Every field is pinned here; nothing is left for provider fillers to
/// guess, which is what makes simulate mode byte-identical to a live run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub to: Address,
    pub data: Bytes,
    /// Native value attached (execution fee, plus native collateral when the
    /// start token is the wrapped native token on an increase)
    pub value: U256,
    pub chain_id: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    /// Always 0: no tip bidding
    pub max_priority_fee_per_gas: u128,
    pub nonce: u64,
}

impl TransactionEnvelope {
    /// Lower into an alloy request with every field set explicitly
    pub fn to_request(&self) -> TransactionRequest {
        TransactionRequest::default()
            .with_to(self.to)
            .with_input(self.data.clone())
            .with_value(self.value)
            .with_chain_id(self.chain_id)
            .with_nonce(self.nonce)
            .with_gas_limit(self.gas_limit)
            .with_max_fee_per_gas(self.max_fee_per_gas)
            .with_max_priority_fee_per_gas(self.max_priority_fee_per_gas)
    }
}

/// Terminal state of one pipeline run
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Broadcast to the network, identified by its transaction hash
    Broadcast(alloy::primitives::TxHash),
    /// Simulate mode: signed but never sent
    Discarded {
        envelope: TransactionEnvelope,
        /// Raw signed transaction bytes that would have been broadcast
        raw: Bytes,
    },
}
