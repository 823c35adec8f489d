//! Constants and precision values for the GMX SDK

use alloy::primitives::U256;

/// GMX quotes USD values with 30 implied decimals
pub const USD_DECIMALS: u8 = 30;

/// A position must be backed by at least this much collateral, in USD
pub const MIN_COLLATERAL_USD: f64 = 2.0;

/// Venue-wide leverage cap used when the caller does not configure one
pub const MAX_LEVERAGE: f64 = 100.0;

/// Default slippage tolerance (0.3%), as a fraction
pub const DEFAULT_SLIPPAGE: f64 = 0.003;

/// Max fee per gas defaults to this multiple of the current base fee
pub const BASE_FEE_MULTIPLIER: f64 = 1.35;

/// Padding applied to the keeper execution fee
pub const EXECUTION_BUFFER: f64 = 1.3;

/// Fixed gas limit for ERC-20 approval transactions
pub const APPROVAL_GAS_LIMIT: u64 = 4_000_000;

/// Scale a non-negative floating point value to U256 with the given decimals.
///
/// The whole part is shifted in integer space so exponents past f64's exact
/// range (the 30-decimal USD scale in particular) stay exact; only the
/// fractional part goes through float arithmetic, and it never needs more
/// than `decimals` digits.
pub fn scale_to_decimals(value: f64, decimals: u8) -> U256 {
    let value = value.max(0.0);
    let base = U256::from(10u64).pow(U256::from(decimals as u64));
    let whole = U256::from(value.trunc() as u128) * base;
    let frac = value.fract();
    let frac_scaled = if decimals > 18 {
        let frac_units = (frac * 1e18) as u128;
        U256::from(frac_units) * U256::from(10u64).pow(U256::from((decimals - 18) as u64))
    } else {
        U256::from((frac * 10f64.powi(decimals as i32)).round() as u128)
    };
    whole + frac_scaled
}

/// Unscale a U256 value to floating point with the given decimals
pub fn unscale_from_decimals(value: U256, decimals: u8) -> f64 {
    let value_f64: f64 = value.to_string().parse().unwrap_or(f64::MAX);
    value_f64 / 10f64.powi(decimals as i32)
}

/// Scale a USD amount to the 30-decimal fixed point
pub fn scale_usd(amount: f64) -> U256 {
    scale_to_decimals(amount, USD_DECIMALS)
}

/// Convert a feed-scale price (USD per smallest token unit, 30 implied
/// decimals) into USD per whole token
pub fn oracle_price_to_usd(price_full: f64, token_decimals: u8) -> f64 {
    price_full * 10f64.powi(token_decimals as i32 - USD_DECIMALS as i32)
}
