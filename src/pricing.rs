//! Execution price and slippage computation

use crate::constants::USD_DECIMALS;
use crate::oracle::PriceQuote;
use alloy::primitives::U256;

/// What the order is doing to the position, for pricing purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceIntent {
    /// Opening or growing a position
    Open,
    /// Closing or shrinking a position
    Close,
    /// Swapping tokens; the reference price is not slippage-adjusted
    Swap,
}

/// Execution price derived from one oracle quote.
///
/// Computed fresh per order and never cached: the acceptable price must
/// reflect the feed at submission time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionPrice {
    /// Median of the raw bid/ask, at the feed scale
    pub median: f64,
    /// Median shifted by the slippage tolerance in the adverse direction
    pub slippage_adjusted: f64,
    /// `floor(slippage_adjusted)` rescaled to `10^(token_decimals - 30)`
    pub acceptable_price: U256,
}

/// Compute the slippage-bounded execution price for one order.
///
/// Opening a long or closing a short tolerates a higher price; opening a
/// short or closing a long tolerates a lower one. Swaps keep the unadjusted
/// median as their reference.
pub fn execution_price(
    token_decimals: u8,
    quote: PriceQuote,
    is_long: bool,
    intent: PriceIntent,
    slippage: f64,
) -> ExecutionPrice {
    let median = quote.median();
    let slippage_adjusted = match intent {
        PriceIntent::Open => {
            if is_long {
                median * (1.0 + slippage)
            } else {
                median * (1.0 - slippage)
            }
        }
        PriceIntent::Close => {
            if is_long {
                median * (1.0 - slippage)
            } else {
                median * (1.0 + slippage)
            }
        }
        PriceIntent::Swap => median,
    };
    ExecutionPrice {
        median,
        slippage_adjusted,
        acceptable_price: rescale_price(slippage_adjusted, token_decimals),
    }
}

/// Rescale a feed-scale price to `10^(token_decimals - 30)` integer units.
///
/// The exponent is negative for every real token (decimals < 30), so the
/// negative power of ten becomes an integer division; truncation is bounded
/// by the token's decimal count.
fn rescale_price(price: f64, token_decimals: u8) -> U256 {
    let floored = U256::from(price.max(0.0) as u128);
    if token_decimals >= USD_DECIMALS {
        floored * U256::from(10u64).pow(U256::from((token_decimals - USD_DECIMALS) as u64))
    } else {
        floored / U256::from(10u64).pow(U256::from((USD_DECIMALS - token_decimals) as u64))
    }
}
