//! Parameter resolution: complete and validate a partial order request
//!
//! The resolver fills every derivable field of an [`OrderRequest`], applies
//! the leverage and minimum-collateral rules, and scales the human-readable
//! amounts to on-chain integer units. It works against one point-in-time
//! view of the registries and oracle; nothing here touches the network.

use crate::constants::{
    oracle_price_to_usd, scale_to_decimals, scale_usd, DEFAULT_SLIPPAGE, MIN_COLLATERAL_USD,
};
use crate::error::OrderError;
use crate::oracle::OracleSnapshot;
use crate::registry::{MarketRegistry, TokenRegistry};
use crate::types::{OrderKind, OrderRequest, ResolvedOrder};
use tracing::debug;

/// Fields a request must carry, or derive, before it can be built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Chain,
    IndexTokenAddress,
    MarketKey,
    StartTokenAddress,
    OutTokenAddress,
    CollateralAddress,
    SwapPath,
    IsLong,
    SizeDeltaUsd,
    InitialCollateralDelta,
    SlippagePercent,
}

impl RequiredField {
    /// Required-field list for an order kind.
    ///
    /// Order matters: start token resolves before collateral (which defaults
    /// to it), and both resolve before the swap path.
    pub fn for_kind(kind: OrderKind) -> &'static [RequiredField] {
        use RequiredField::*;
        match kind {
            OrderKind::Increase => &[
                Chain,
                IndexTokenAddress,
                MarketKey,
                StartTokenAddress,
                CollateralAddress,
                SwapPath,
                IsLong,
                SizeDeltaUsd,
                InitialCollateralDelta,
                SlippagePercent,
            ],
            OrderKind::Decrease => &[
                Chain,
                IndexTokenAddress,
                MarketKey,
                StartTokenAddress,
                CollateralAddress,
                IsLong,
                SizeDeltaUsd,
                InitialCollateralDelta,
                SlippagePercent,
            ],
            OrderKind::Swap => &[
                Chain,
                StartTokenAddress,
                OutTokenAddress,
                InitialCollateralDelta,
                SwapPath,
                SlippagePercent,
            ],
        }
    }
}

fn missing(field: RequiredField) -> OrderError {
    OrderError::MissingField {
        fields: vec![field],
    }
}

/// Resolver over one snapshot of the registries and oracle
pub struct Resolver<'a> {
    tokens: &'a TokenRegistry,
    markets: &'a MarketRegistry,
    oracle: &'a OracleSnapshot,
    max_leverage: f64,
}

impl<'a> Resolver<'a> {
    pub fn new(
        tokens: &'a TokenRegistry,
        markets: &'a MarketRegistry,
        oracle: &'a OracleSnapshot,
    ) -> Self {
        Self {
            tokens,
            markets,
            oracle,
            max_leverage: crate::constants::MAX_LEVERAGE,
        }
    }

    /// Override the venue leverage cap
    pub fn with_max_leverage(mut self, max_leverage: f64) -> Self {
        self.max_leverage = max_leverage;
        self
    }

    /// Complete and validate a request.
    ///
    /// Every underivable field is collected and reported in one
    /// `MissingField` rejection. The sizing, leverage, and collateral rules
    /// run only after the field set is complete; the scaling step runs
    /// unconditionally, even when nothing was missing.
    pub fn resolve(&self, request: &OrderRequest) -> Result<ResolvedOrder, OrderError> {
        // the chain gates everything else: no default chain, ever
        let Some(chain) = request.chain else {
            return Err(missing(RequiredField::Chain));
        };

        let mut working = request.clone();
        let mut missing_fields = Vec::new();
        for &field in RequiredField::for_kind(working.kind) {
            if !self.try_derive(&mut working, field) {
                missing_fields.push(field);
            }
        }
        if !missing_fields.is_empty() {
            return Err(OrderError::MissingField {
                fields: missing_fields,
            });
        }

        if working.kind != OrderKind::Swap {
            self.fill_position_size(&mut working)?;
            self.check_leverage(&working)?;
        }
        if working.kind == OrderKind::Increase {
            self.check_min_collateral(&working)?;
        }

        self.finalize(working, chain)
    }

    /// Attempt to fill one field, returning whether it is now present
    fn try_derive(&self, req: &mut OrderRequest, field: RequiredField) -> bool {
        use RequiredField::*;
        match field {
            Chain => req.chain.is_some(),
            IndexTokenAddress => {
                if req.index_token_address.is_some() {
                    return true;
                }
                let Some(symbol) = req.index_token_symbol.as_deref() else {
                    return false;
                };
                match self.tokens.by_symbol(symbol) {
                    Some(token) => {
                        debug!(symbol, address = %token.address, "derived index token address");
                        req.index_token_address = Some(token.address);
                        true
                    }
                    None => false,
                }
            }
            MarketKey => {
                if req.market_key.is_some() {
                    return true;
                }
                let Some(index) = req.index_token_address else {
                    return false;
                };
                match self.markets.market_for_index(index) {
                    Some(market) => {
                        debug!(market = %market.market_token, "derived market key");
                        req.market_key = Some(market.market_token);
                        true
                    }
                    None => false,
                }
            }
            StartTokenAddress => {
                if req.start_token_address.is_some() {
                    return true;
                }
                if let Some(symbol) = req.start_token_symbol.as_deref() {
                    match self.tokens.by_symbol(symbol) {
                        Some(token) => {
                            req.start_token_address = Some(token.address);
                            return true;
                        }
                        None => return false,
                    }
                }
                // the collateral token doubles as the start token when no
                // swap is requested
                if let Some(collateral) = req.collateral_address {
                    req.start_token_address = Some(collateral);
                    return true;
                }
                false
            }
            OutTokenAddress => {
                if req.out_token_address.is_some() {
                    return true;
                }
                let Some(symbol) = req.out_token_symbol.as_deref() else {
                    return false;
                };
                match self.tokens.by_symbol(symbol) {
                    Some(token) => {
                        req.out_token_address = Some(token.address);
                        true
                    }
                    None => false,
                }
            }
            CollateralAddress => {
                if req.collateral_address.is_some() {
                    return true;
                }
                match req.start_token_address {
                    Some(start) => {
                        req.collateral_address = Some(start);
                        true
                    }
                    None => false,
                }
            }
            SwapPath => {
                if req.swap_path.is_some() {
                    return true;
                }
                self.derive_swap_path(req)
            }
            // direction is intent; it cannot be guessed
            IsLong => req.is_long.is_some(),
            SlippagePercent => {
                if req.slippage_percent.is_none() {
                    req.slippage_percent = Some(DEFAULT_SLIPPAGE);
                }
                true
            }
            // tolerated here; the sizing step fills whichever is implied by
            // the other plus leverage
            SizeDeltaUsd | InitialCollateralDelta => true,
        }
    }

    /// Empty path when source and destination already match; a single hop
    /// when one market's pool tokens cover both; otherwise fail rather than
    /// guess a multi-hop route
    fn derive_swap_path(&self, req: &mut OrderRequest) -> bool {
        let (from, to) = match req.kind {
            OrderKind::Increase | OrderKind::Decrease => {
                match (req.start_token_address, req.collateral_address) {
                    (Some(start), Some(collateral)) => (start, collateral),
                    _ => return false,
                }
            }
            OrderKind::Swap => match (req.start_token_address, req.out_token_address) {
                (Some(start), Some(out)) => (start, out),
                _ => return false,
            },
        };

        if from == to {
            req.swap_path = Some(Vec::new());
            return true;
        }
        match self.markets.direct_swap_market(from, to) {
            Some(market) => {
                req.swap_path = Some(vec![market.market_token]);
                true
            }
            None => false,
        }
    }

    /// USD value of the collateral delta, via the median oracle price of the
    /// start token adjusted for its decimals
    fn collateral_usd(&self, req: &OrderRequest) -> Result<f64, OrderError> {
        let Some(token) = req.start_token_address else {
            return Err(missing(RequiredField::StartTokenAddress));
        };
        let Some(amount) = req.initial_collateral_delta else {
            return Err(missing(RequiredField::InitialCollateralDelta));
        };
        let quote = self.oracle.quote(token)?;
        // a token the registry cannot price is as good as unquoted
        let decimals = self
            .tokens
            .decimals(token)
            .ok_or(OrderError::PriceUnavailable { token })?;
        Ok(oracle_price_to_usd(quote.median(), decimals) * amount)
    }

    /// Fill whichever of size/collateral the request omitted, from the other
    /// plus the requested leverage
    fn fill_position_size(&self, req: &mut OrderRequest) -> Result<(), OrderError> {
        match (req.size_delta_usd, req.initial_collateral_delta) {
            (Some(_), Some(_)) => Ok(()),
            (None, Some(_)) => {
                let Some(leverage) = req.leverage else {
                    return Err(missing(RequiredField::SizeDeltaUsd));
                };
                let collateral_usd = self.collateral_usd(req)?;
                let size = leverage * collateral_usd;
                debug!(size, "implied size delta from leverage");
                req.size_delta_usd = Some(size);
                Ok(())
            }
            (Some(size), None) => {
                let Some(leverage) = req.leverage else {
                    return Err(missing(RequiredField::InitialCollateralDelta));
                };
                let Some(token) = req.start_token_address else {
                    return Err(missing(RequiredField::StartTokenAddress));
                };
                let quote = self.oracle.quote(token)?;
                let decimals = self
                    .tokens
                    .decimals(token)
                    .ok_or(OrderError::PriceUnavailable { token })?;
                let price_usd = oracle_price_to_usd(quote.median(), decimals);
                let collateral = size / leverage / price_usd;
                debug!(collateral, "implied collateral delta from leverage");
                req.initial_collateral_delta = Some(collateral);
                Ok(())
            }
            (None, None) => Err(OrderError::MissingField {
                fields: vec![
                    RequiredField::SizeDeltaUsd,
                    RequiredField::InitialCollateralDelta,
                ],
            }),
        }
    }

    fn check_leverage(&self, req: &OrderRequest) -> Result<(), OrderError> {
        let collateral_usd = self.collateral_usd(req)?;
        let size = req.size_delta_usd.unwrap_or(0.0);
        let requested = size / collateral_usd;
        if requested > self.max_leverage {
            return Err(OrderError::LeverageExceeded {
                requested,
                maximum: self.max_leverage,
            });
        }
        Ok(())
    }

    fn check_min_collateral(&self, req: &OrderRequest) -> Result<(), OrderError> {
        let collateral_usd = self.collateral_usd(req)?;
        if collateral_usd < MIN_COLLATERAL_USD {
            return Err(OrderError::CollateralTooLow {
                collateral_usd,
                minimum_usd: MIN_COLLATERAL_USD,
            });
        }
        Ok(())
    }

    /// Scale the human-readable amounts to on-chain integer units and freeze
    /// the result
    fn finalize(
        &self,
        req: OrderRequest,
        chain: crate::config::Chain,
    ) -> Result<ResolvedOrder, OrderError> {
        let Some(start) = req.start_token_address else {
            return Err(missing(RequiredField::StartTokenAddress));
        };
        let decimals = self
            .tokens
            .decimals(start)
            .ok_or(OrderError::PriceUnavailable { token: start })?;
        let Some(collateral_delta) = req.initial_collateral_delta else {
            return Err(missing(RequiredField::InitialCollateralDelta));
        };

        let size_delta_scaled = match req.kind {
            OrderKind::Swap => None,
            _ => {
                let Some(size) = req.size_delta_usd else {
                    return Err(missing(RequiredField::SizeDeltaUsd));
                };
                Some(scale_usd(size))
            }
        };

        Ok(ResolvedOrder {
            kind: req.kind,
            chain,
            market_key: req.market_key,
            index_token_address: req.index_token_address,
            start_token_address: start,
            out_token_address: req.out_token_address,
            collateral_address: req.collateral_address,
            swap_path: req.swap_path.unwrap_or_default(),
            is_long: req.is_long,
            size_delta_usd: req.size_delta_usd,
            initial_collateral_delta: collateral_delta,
            slippage_percent: req.slippage_percent.unwrap_or(DEFAULT_SLIPPAGE),
            size_delta_scaled,
            collateral_delta_scaled: scale_to_decimals(collateral_delta, decimals),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Chain;
    use crate::oracle::PriceQuote;
    use crate::registry::{MarketInfo, TokenInfo, BRIDGED_BTC, SYNTHETIC_BTC};
    use alloy::primitives::{address, Address, U256};

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

    fn oracle() -> OracleSnapshot {
        // USDC at exactly 1 USD: feed scale is 10^(30-6) = 10^24.
        // WBTC at 60000/60010: feed scale is 10^(30-8) = 10^22.
        OracleSnapshot::from_quotes([
            (
                USDC,
                PriceQuote {
                    min: 1.0e24,
                    max: 1.0e24,
                },
            ),
            (
                BRIDGED_BTC,
                PriceQuote {
                    min: 60_000.0e22,
                    max: 60_010.0e22,
                },
            ),
        ])
    }

    fn resolver<'a>(
        t: &'a TokenRegistry,
        m: &'a MarketRegistry,
        o: &'a OracleSnapshot,
    ) -> Resolver<'a> {
        Resolver::new(t, m, o)
    }

    fn btc_increase() -> OrderRequest {
        OrderRequest::increase()
            .with_chain(Chain::Arbitrum)
            .with_index_token_symbol("BTC")
            .with_start_token_symbol("USDC")
            .long()
            .with_size_delta_usd(1000.0)
            .with_initial_collateral_delta(50.0)
            .with_slippage(0.003)
    }

    #[test]
    fn test_missing_chain_always_fails() {
        let (t, m, o) = (tokens(), markets(), oracle());
        // everything else derivable, chain still absent
        let request = btc_increase();
        let request = OrderRequest {
            chain: None,
            ..request
        };
        match resolver(&t, &m, &o).resolve(&request) {
            Err(OrderError::MissingField { fields }) => {
                assert_eq!(fields, vec![RequiredField::Chain]);
            }
            other => panic!("expected MissingField(Chain), got {other:?}"),
        }
    }

    #[test]
    fn test_btc_alias_end_to_end() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let resolved = resolver(&t, &m, &o).resolve(&btc_increase()).unwrap();

        // "BTC" resolved through the WBTC.b listing
        assert_eq!(resolved.index_token_address, Some(BRIDGED_BTC));
        // market found via the synthetic-BTC lookup substitution
        assert_eq!(resolved.market_key, Some(BTC_MARKET));
        // collateral defaulted to the start token, so no swap hop
        assert_eq!(resolved.collateral_address, Some(USDC));
        assert!(resolved.swap_path.is_empty());
        // exact 30-decimal scaling
        let expected_size = U256::from(1000u64) * U256::from(10u64).pow(U256::from(30u64));
        assert_eq!(resolved.size_delta_scaled, Some(expected_size));
        assert_eq!(resolved.collateral_delta_scaled, U256::from(50_000_000u64));
    }

    #[test]
    fn test_unknown_symbol_reports_all_missing_fields() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let request = OrderRequest::increase()
            .with_chain(Chain::Arbitrum)
            .with_index_token_symbol("DOGE")
            .with_size_delta_usd(100.0)
            .with_initial_collateral_delta(50.0);
        match resolver(&t, &m, &o).resolve(&request) {
            Err(OrderError::MissingField { fields }) => {
                // index token underivable, and everything downstream of it
                assert!(fields.contains(&RequiredField::IndexTokenAddress));
                assert!(fields.contains(&RequiredField::MarketKey));
                assert!(fields.contains(&RequiredField::StartTokenAddress));
                assert!(fields.contains(&RequiredField::IsLong));
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_collateral_floor() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let request = btc_increase()
            .with_size_delta_usd(10.0)
            .with_initial_collateral_delta(1.5); // 1.50 USD of USDC
        match resolver(&t, &m, &o).resolve(&request) {
            Err(OrderError::CollateralTooLow {
                collateral_usd,
                minimum_usd,
            }) => {
                assert!((collateral_usd - 1.5).abs() < 1e-9);
                assert_eq!(minimum_usd, MIN_COLLATERAL_USD);
            }
            other => panic!("expected CollateralTooLow, got {other:?}"),
        }
    }

    #[test]
    fn test_leverage_cap() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let request = btc_increase().with_size_delta_usd(10_000.0); // 200x on 50 USD
        match resolver(&t, &m, &o).resolve(&request) {
            Err(OrderError::LeverageExceeded { requested, maximum }) => {
                assert!((requested - 200.0).abs() < 1e-6);
                assert_eq!(maximum, crate::constants::MAX_LEVERAGE);
            }
            other => panic!("expected LeverageExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_size_implied_from_leverage() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let request = OrderRequest {
            size_delta_usd: None,
            ..btc_increase()
        }
        .with_leverage(10.0);
        let resolved = resolver(&t, &m, &o).resolve(&request).unwrap();
        // 50 USDC collateral at 1 USD, 10x leverage
        assert!((resolved.size_delta_usd.unwrap() - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_collateral_implied_from_leverage() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let request = OrderRequest {
            initial_collateral_delta: None,
            ..btc_increase()
        }
        .with_leverage(20.0);
        let resolved = resolver(&t, &m, &o).resolve(&request).unwrap();
        // 1000 USD at 20x needs 50 USD of USDC
        assert!((resolved.initial_collateral_delta - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_decrease_needs_no_swap_path() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let request = OrderRequest {
            kind: OrderKind::Decrease,
            ..btc_increase()
        };
        let resolved = resolver(&t, &m, &o).resolve(&request).unwrap();
        assert_eq!(resolved.kind, OrderKind::Decrease);
        assert!(resolved.swap_path.is_empty());
    }

    #[test]
    fn test_swap_resolution() {
        let (t, m, o) = (tokens(), markets(), oracle());
        let request = OrderRequest::swap()
            .with_chain(Chain::Arbitrum)
            .with_start_token_symbol("USDC")
            .with_out_token_symbol("BTC")
            .with_initial_collateral_delta(100.0);
        let resolved = resolver(&t, &m, &o).resolve(&request).unwrap();
        assert_eq!(resolved.out_token_address, Some(BRIDGED_BTC));
        // single hop through the BTC market pool
        assert_eq!(resolved.swap_path, vec![BTC_MARKET]);
        // swaps carry no USD size
        assert_eq!(resolved.size_delta_scaled, None);
        // default slippage filled in
        assert_eq!(resolved.slippage_percent, DEFAULT_SLIPPAGE);
    }

    #[test]
    fn test_swap_skips_collateral_floor() {
        let (t, m, o) = (tokens(), markets(), oracle());
        // worth well under 2 USD, but swaps have no collateral rule
        let request = OrderRequest::swap()
            .with_chain(Chain::Arbitrum)
            .with_start_token_symbol("USDC")
            .with_out_token_symbol("BTC")
            .with_initial_collateral_delta(0.5);
        assert!(resolver(&t, &m, &o).resolve(&request).is_ok());
    }
}
