//! Order assembly and submission pipeline
//!
//! One submission walks Initialized -> Resolved -> Priced -> Budgeted ->
//! Enveloped -> Signed -> Broadcast (or Discarded in simulate mode). No
//! state is revisited; a failure aborts the whole run. Retrying means a new
//! run with a fresh nonce and fresh price/gas reads, since those are
//! time-sensitive.

use crate::client::GmxClient;
use crate::config::ChainConfig;
use crate::constants::EXECUTION_BUFFER;
use crate::contracts::{
    CreateOrderParams, CreateOrderParamsAddresses, CreateOrderParamsNumbers,
    DecreasePositionSwapType, IExchangeRouter, OrderType,
};
use crate::error::OrderError;
use crate::gas::{self, GasPlan};
use crate::oracle::OracleSnapshot;
use crate::pricing::execution_price;
use crate::registry::TokenRegistry;
use crate::resolver::{RequiredField, Resolver};
use crate::signer::TransactionSigner;
use crate::types::{
    OrderKind, OrderRequest, ResolvedOrder, SubmitMode, SubmitOutcome, TransactionEnvelope,
};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use tracing::{debug, info, warn};

/// Knobs for one submission run
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub mode: SubmitMode,
    /// Override for max fee per gas; defaults to 1.35x the current base fee
    pub max_fee_per_gas: Option<u128>,
    /// Raise a missing collateral allowance automatically
    pub auto_approve: bool,
    /// Ask keepers to cancel the order if it cannot execute
    pub auto_cancel: bool,
    /// Padding applied to the keeper execution fee
    pub execution_buffer: f64,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            mode: SubmitMode::Live,
            max_fee_per_gas: None,
            auto_approve: true,
            auto_cancel: false,
            execution_buffer: EXECUTION_BUFFER,
        }
    }
}

impl SubmitOptions {
    /// Run the pipeline through signing but never broadcast
    pub fn simulate() -> Self {
        Self {
            mode: SubmitMode::Simulate,
            ..Default::default()
        }
    }
}

/// Time-sensitive inputs gathered immediately before assembly
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Account receiving the position / swap output
    pub receiver: Address,
    /// Slippage-bounded acceptable price, already rescaled
    pub acceptable_price: U256,
    pub gas: GasPlan,
    /// Native amount escrowed for the keeper
    pub execution_fee: U256,
    pub nonce: u64,
    pub auto_cancel: bool,
}

/// Assemble the multicall envelope for a resolved order.
///
/// Pure: identical inputs produce an identical envelope, which is what makes
/// simulate mode a faithful dry run of the live path.
pub fn assemble_envelope(
    order: &ResolvedOrder,
    config: &ChainConfig,
    ctx: &BuildContext,
) -> TransactionEnvelope {
    let native_collateral =
        order.kind == OrderKind::Increase && order.start_token_address == config.wrapped_native;

    // native value forwarded to the vault: always the execution fee, plus
    // the collateral itself when it arrives as the native token
    let mut wnt_amount = ctx.execution_fee;
    if native_collateral {
        wnt_amount += order.collateral_delta_scaled;
    }

    let mut calls: Vec<Bytes> = Vec::new();
    calls.push(
        IExchangeRouter::sendWntCall {
            receiver: config.order_vault,
            amount: wnt_amount,
        }
        .abi_encode()
        .into(),
    );

    let moves_erc20 =
        matches!(order.kind, OrderKind::Increase | OrderKind::Swap) && !native_collateral;
    if moves_erc20 {
        calls.push(
            IExchangeRouter::sendTokensCall {
                token: order.start_token_address,
                receiver: config.order_vault,
                amount: order.collateral_delta_scaled,
            }
            .abi_encode()
            .into(),
        );
    }

    calls.push(
        IExchangeRouter::createOrderCall {
            params: create_order_params(order, config, ctx),
        }
        .abi_encode()
        .into(),
    );

    let data = IExchangeRouter::multicallCall { data: calls }.abi_encode();

    TransactionEnvelope {
        to: config.exchange_router,
        data: data.into(),
        value: wnt_amount,
        chain_id: config.chain_id,
        gas_limit: ctx.gas.call_gas_ceiling,
        max_fee_per_gas: ctx.gas.max_fee_per_gas,
        max_priority_fee_per_gas: ctx.gas.max_priority_fee_per_gas,
        nonce: ctx.nonce,
    }
}

fn create_order_params(
    order: &ResolvedOrder,
    config: &ChainConfig,
    ctx: &BuildContext,
) -> CreateOrderParams {
    let should_unwrap = match order.kind {
        OrderKind::Increase => false,
        OrderKind::Decrease => order.start_token_address == config.wrapped_native,
        OrderKind::Swap => order.out_token_address == Some(config.wrapped_native),
    };

    CreateOrderParams {
        addresses: CreateOrderParamsAddresses {
            receiver: ctx.receiver,
            cancellationReceiver: Address::ZERO,
            callbackContract: Address::ZERO,
            uiFeeReceiver: Address::ZERO,
            market: order.market_key.unwrap_or(Address::ZERO),
            initialCollateralToken: order.start_token_address,
            swapPath: order.swap_path.clone(),
        },
        numbers: CreateOrderParamsNumbers {
            sizeDeltaUsd: order.size_delta_scaled.unwrap_or(U256::ZERO),
            initialCollateralDeltaAmount: order.collateral_delta_scaled,
            triggerPrice: U256::ZERO,
            acceptablePrice: ctx.acceptable_price,
            executionFee: ctx.execution_fee,
            callbackGasLimit: U256::ZERO,
            minOutputAmount: U256::ZERO,
            validFromTime: U256::ZERO,
        },
        orderType: market_order_type(order.kind).into(),
        decreasePositionSwapType: decrease_swap_type(order.kind).into(),
        isLong: order.is_long.unwrap_or(false),
        shouldUnwrapNativeToken: should_unwrap,
        autoCancel: ctx.auto_cancel,
        referralCode: B256::ZERO,
    }
}

fn market_order_type(kind: OrderKind) -> OrderType {
    match kind {
        OrderKind::Increase => OrderType::MarketIncrease,
        OrderKind::Decrease => OrderType::MarketDecrease,
        OrderKind::Swap => OrderType::MarketSwap,
    }
}

fn decrease_swap_type(kind: OrderKind) -> DecreasePositionSwapType {
    match kind {
        // realized PnL comes back in the collateral token
        OrderKind::Decrease => DecreasePositionSwapType::SwapPnlTokenToCollateralToken,
        _ => DecreasePositionSwapType::NoSwap,
    }
}

/// The token whose quote bounds the execution price
fn price_reference_token(order: &ResolvedOrder) -> Result<Address, OrderError> {
    match order.kind {
        OrderKind::Swap => Ok(order
            .out_token_address
            .unwrap_or(order.start_token_address)),
        _ => order.index_token_address.ok_or(OrderError::MissingField {
            fields: vec![RequiredField::IndexTokenAddress],
        }),
    }
}

impl<S: TransactionSigner> GmxClient<S> {
    /// Complete and validate a partial order request against fresh registry
    /// and oracle snapshots
    pub async fn resolve_order(&self, request: &OrderRequest) -> Result<ResolvedOrder, OrderError> {
        let (tokens, markets, snapshot) = self
            .fetch_snapshots()
            .await
            .map_err(OrderError::submission)?;
        let resolver = Resolver::new(&tokens, &markets, &snapshot)
            .with_max_leverage(self.config().max_leverage);
        resolver.resolve(request)
    }

    /// Run one resolved order through the pipeline and broadcast it, or stop
    /// short of broadcast in simulate mode.
    ///
    /// The allowance step (increase orders moving an ERC-20) settles before
    /// any price or gas input is read, so those inputs reflect post-approval
    /// state. Nonce, prices, and gas are all read fresh within this call.
    ///
    /// Simulate mode discards the order transaction after signing, but the
    /// allowance pre-flight still submits a real approval when one is needed
    /// and `auto_approve` is set; disable `auto_approve` for a fully
    /// read-only run.
    pub async fn build_and_submit(
        &self,
        order: &ResolvedOrder,
        options: &SubmitOptions,
    ) -> Result<SubmitOutcome, OrderError> {
        debug!(kind = ?order.kind, "pipeline start");
        let chain = self.config().chain;
        let price_token = price_reference_token(order)?;

        let max_fee = self
            .max_fee_per_gas(options.max_fee_per_gas)
            .await
            .map_err(OrderError::submission)?;

        if order.kind == OrderKind::Increase
            && order.start_token_address != self.config().wrapped_native
        {
            self.ensure_allowance(
                self.config().synthetics_router,
                order.start_token_address,
                order.collateral_delta_scaled,
                max_fee,
                options.auto_approve,
            )
            .await?;
        }

        // read-only fan-out: price inputs and the gas-limit table together
        let price_inputs = async {
            futures::future::try_join(TokenRegistry::fetch(chain), OracleSnapshot::fetch(chain))
                .await
                .map_err(|err| {
                    warn!(%err, "price input fetch failed");
                    OrderError::PriceUnavailable { token: price_token }
                })
        };
        let gas_inputs = async {
            futures::future::try_join(self.fetch_gas_limits(), self.get_gas_price())
                .await
                .map_err(OrderError::submission)
        };
        let ((tokens, snapshot), (table, gas_price)) =
            futures::future::try_join(price_inputs, gas_inputs).await?;

        let quote = snapshot.quote(price_token)?;
        let decimals = tokens
            .decimals(price_token)
            .ok_or(OrderError::PriceUnavailable { token: price_token })?;
        let price = execution_price(
            decimals,
            quote,
            order.is_long.unwrap_or(false),
            order.kind.intent(),
            order.slippage_percent,
        );
        debug!(
            median = price.median,
            adjusted = price.slippage_adjusted,
            "priced"
        );

        let plan = GasPlan::new(table.base_limit(order.kind), max_fee);
        let execution_fee = gas::execution_fee(
            table.execution_fee_base,
            table.execution_fee_multiplier,
            plan.base_limit,
            gas_price,
            options.execution_buffer,
        );
        debug!(
            base_limit = plan.base_limit,
            ceiling = plan.call_gas_ceiling,
            fee = %execution_fee,
            "budgeted"
        );

        // one nonce per signed transaction, read immediately before assembly
        let nonce = self
            .get_nonce(self.address())
            .await
            .map_err(OrderError::submission)?;

        let ctx = BuildContext {
            receiver: self.address(),
            acceptable_price: price.acceptable_price,
            gas: plan,
            execution_fee,
            nonce,
            auto_cancel: options.auto_cancel,
        };
        let envelope = assemble_envelope(order, self.config(), &ctx);
        debug!(nonce, gas_limit = envelope.gas_limit, value = %envelope.value, "enveloped");

        let raw = self
            .signer()
            .sign(&envelope)
            .await
            .map_err(OrderError::submission)?;

        match options.mode {
            SubmitMode::Simulate => {
                info!("simulate mode: discarding signed transaction");
                Ok(SubmitOutcome::Discarded { envelope, raw })
            }
            SubmitMode::Live => {
                let tx_hash = self
                    .submit_raw(&raw)
                    .await
                    .map_err(OrderError::submission)?;
                info!(%tx_hash, "order submitted");
                Ok(SubmitOutcome::Broadcast(tx_hash))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Chain;
    use alloy::primitives::address;

    const USDC: Address = address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831");
    const BTC_MARKET: Address = address!("0x47c031236e19d024b42f8AE6780E44A573170703");
    const WBTC: Address = address!("0x2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f");

    fn config() -> ChainConfig {
        ChainConfig::arbitrum_with_rpc("http://localhost:8545")
    }

    fn increase_order() -> ResolvedOrder {
        ResolvedOrder {
            kind: OrderKind::Increase,
            chain: Chain::Arbitrum,
            market_key: Some(BTC_MARKET),
            index_token_address: Some(WBTC),
            start_token_address: USDC,
            out_token_address: None,
            collateral_address: Some(USDC),
            swap_path: vec![],
            is_long: Some(true),
            size_delta_usd: Some(1000.0),
            initial_collateral_delta: 50.0,
            slippage_percent: 0.003,
            size_delta_scaled: Some(crate::constants::scale_usd(1000.0)),
            collateral_delta_scaled: U256::from(50_000_000u64),
        }
    }

    fn ctx(nonce: u64) -> BuildContext {
        BuildContext {
            receiver: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            acceptable_price: U256::from(60_185u64),
            gas: GasPlan::new(4_000_000, 100_000_000),
            execution_fee: U256::from(1_000_000_000_000_000u64),
            nonce,
            auto_cancel: false,
        }
    }

    fn inner_calls(envelope: &TransactionEnvelope) -> Vec<Bytes> {
        IExchangeRouter::multicallCall::abi_decode(&envelope.data)
            .expect("envelope should hold a multicall")
            .data
    }

    #[test]
    fn test_increase_multicall_shape() {
        let order = increase_order();
        let envelope = assemble_envelope(&order, &config(), &ctx(7));

        assert_eq!(envelope.to, config().exchange_router);
        assert_eq!(envelope.chain_id, 42161);
        assert_eq!(envelope.gas_limit, 8_000_000);
        assert_eq!(envelope.max_priority_fee_per_gas, 0);
        // ERC-20 collateral: value carries only the execution fee
        assert_eq!(envelope.value, U256::from(1_000_000_000_000_000u64));

        let calls = inner_calls(&envelope);
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with(&IExchangeRouter::sendWntCall::SELECTOR));
        assert!(calls[1].starts_with(&IExchangeRouter::sendTokensCall::SELECTOR));
        assert!(calls[2].starts_with(&IExchangeRouter::createOrderCall::SELECTOR));
    }

    #[test]
    fn test_native_collateral_folds_into_value() {
        let mut order = increase_order();
        order.start_token_address = config().wrapped_native;
        order.collateral_address = Some(config().wrapped_native);
        order.collateral_delta_scaled = U256::from(10u64).pow(U256::from(18u64)); // 1 ETH

        let envelope = assemble_envelope(&order, &config(), &ctx(7));
        let expected_value =
            U256::from(1_000_000_000_000_000u64) + U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(envelope.value, expected_value);
        // no separate sendTokens leg for native collateral
        assert_eq!(inner_calls(&envelope).len(), 2);
    }

    #[test]
    fn test_decrease_moves_no_tokens() {
        let mut order = increase_order();
        order.kind = OrderKind::Decrease;
        let envelope = assemble_envelope(&order, &config(), &ctx(7));
        assert_eq!(inner_calls(&envelope).len(), 2);
        assert_eq!(envelope.value, U256::from(1_000_000_000_000_000u64));
    }

    #[test]
    fn test_envelopes_identical_except_nonce() {
        let order = increase_order();
        let a = assemble_envelope(&order, &config(), &ctx(7));
        let b = assemble_envelope(&order, &config(), &ctx(8));

        assert_eq!(a.nonce, 7);
        assert_eq!(b.nonce, 8);
        assert_eq!(a.data, b.data);
        assert_eq!(a.to, b.to);
        assert_eq!(a.value, b.value);
        assert_eq!(a.gas_limit, b.gas_limit);
        assert_eq!(a.max_fee_per_gas, b.max_fee_per_gas);
        // and with the same nonce the whole envelope is identical
        assert_eq!(a, assemble_envelope(&order, &config(), &ctx(7)));
    }

    #[test]
    fn test_create_order_params_carry_resolved_amounts() {
        let order = increase_order();
        let params = create_order_params(&order, &config(), &ctx(1));
        assert_eq!(params.addresses.market, BTC_MARKET);
        assert_eq!(params.addresses.initialCollateralToken, USDC);
        assert_eq!(params.numbers.sizeDeltaUsd, crate::constants::scale_usd(1000.0));
        assert_eq!(params.numbers.acceptablePrice, U256::from(60_185u64));
        assert_eq!(params.orderType, u8::from(OrderType::MarketIncrease));
        assert!(params.isLong);
    }

    #[test]
    fn test_swap_params() {
        let order = ResolvedOrder {
            kind: OrderKind::Swap,
            market_key: None,
            index_token_address: None,
            out_token_address: Some(WBTC),
            swap_path: vec![BTC_MARKET],
            is_long: None,
            size_delta_usd: None,
            size_delta_scaled: None,
            ..increase_order()
        };
        let params = create_order_params(&order, &config(), &ctx(1));
        assert_eq!(params.numbers.sizeDeltaUsd, U256::ZERO);
        assert_eq!(params.orderType, u8::from(OrderType::MarketSwap));
        assert_eq!(params.addresses.swapPath, vec![BTC_MARKET]);

        // swap still moves the start token into the vault
        let envelope = assemble_envelope(&order, &config(), &ctx(1));
        assert_eq!(inner_calls(&envelope).len(), 3);
    }
}
