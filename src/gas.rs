//! Gas budgeting against the datastore's on-chain gas-limit table

use crate::types::OrderKind;
use alloy::primitives::{keccak256, B256, U256};
use alloy::sol_types::SolValue;

/// Datastore key names for the gas-limit table, in the order
/// [`GasLimitTable::from_values`] expects them
pub(crate) const TABLE_KEYS: [&str; 8] = [
    "INCREASE_ORDER_GAS_LIMIT",
    "DECREASE_ORDER_GAS_LIMIT",
    "SWAP_ORDER_GAS_LIMIT",
    "SINGLE_SWAP_GAS_LIMIT",
    "DEPOSIT_GAS_LIMIT",
    "WITHDRAWAL_GAS_LIMIT",
    "EXECUTION_GAS_FEE_BASE_AMOUNT",
    "EXECUTION_GAS_FEE_MULTIPLIER_FACTOR",
];

/// Datastore key for a named config entry: `keccak256(abi.encode(name))`
pub fn config_key(name: &str) -> B256 {
    keccak256(name.to_string().abi_encode())
}

/// Datastore key carrying the base gas estimator for an order kind
pub fn order_gas_limit_key(kind: OrderKind) -> B256 {
    match kind {
        OrderKind::Increase => config_key("INCREASE_ORDER_GAS_LIMIT"),
        OrderKind::Decrease => config_key("DECREASE_ORDER_GAS_LIMIT"),
        OrderKind::Swap => config_key("SWAP_ORDER_GAS_LIMIT"),
    }
}

/// Per-kind base gas estimators and execution-fee parameters, read from the
/// datastore in one concurrent sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLimitTable {
    pub increase_order: u64,
    pub decrease_order: u64,
    pub swap_order: u64,
    pub single_swap: u64,
    pub deposit: u64,
    pub withdrawal: u64,
    /// Flat gas amount added to every keeper execution
    pub execution_fee_base: U256,
    /// Per-gas multiplier factor, 30-decimal fixed point
    pub execution_fee_multiplier: U256,
}

impl GasLimitTable {
    /// Build from datastore values ordered as [`TABLE_KEYS`]
    pub(crate) fn from_values(values: &[U256]) -> Self {
        let as_u64 = |v: U256| v.try_into().unwrap_or(u64::MAX);
        Self {
            increase_order: as_u64(values[0]),
            decrease_order: as_u64(values[1]),
            swap_order: as_u64(values[2]),
            single_swap: as_u64(values[3]),
            deposit: as_u64(values[4]),
            withdrawal: as_u64(values[5]),
            execution_fee_base: values[6],
            execution_fee_multiplier: values[7],
        }
    }

    /// Base gas estimator for an order kind
    pub fn base_limit(&self, kind: OrderKind) -> u64 {
        match kind {
            OrderKind::Increase => self.increase_order,
            OrderKind::Decrease => self.decrease_order,
            OrderKind::Swap => self.swap_order,
        }
    }
}

/// Fee-and-gas budget for one envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPlan {
    /// Base estimator from the gas-limit table
    pub base_limit: u64,
    /// Call-gas ceiling: the base estimator counted twice. Deliberately
    /// conservative; exact usage depends on contract storage state at
    /// execution time.
    pub call_gas_ceiling: u64,
    pub max_fee_per_gas: u128,
    /// Always 0: no tip bidding
    pub max_priority_fee_per_gas: u128,
}

impl GasPlan {
    pub fn new(base_limit: u64, max_fee_per_gas: u128) -> Self {
        Self {
            base_limit,
            call_gas_ceiling: base_limit + base_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas: 0,
        }
    }
}

/// Keeper execution fee: `(base + limit * multiplier / 10^30) * gas_price`,
/// padded by the execution buffer (applied at basis-point resolution so the
/// arithmetic stays in integer space)
pub fn execution_fee(
    base_amount: U256,
    multiplier_factor: U256,
    order_gas_limit: u64,
    gas_price: u128,
    buffer: f64,
) -> U256 {
    let precision = U256::from(10u64).pow(U256::from(30u64));
    let adjusted = base_amount + U256::from(order_gas_limit) * multiplier_factor / precision;
    let fee = adjusted * U256::from(gas_price);
    let buffer_bps = U256::from((buffer * 10_000.0) as u64);
    fee * buffer_bps / U256::from(10_000u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> GasLimitTable {
        GasLimitTable::from_values(&[
            U256::from(4_000_000u64),
            U256::from(3_500_000u64),
            U256::from(3_000_000u64),
            U256::from(1_000_000u64),
            U256::from(2_000_000u64),
            U256::from(2_500_000u64),
            U256::ZERO,
            U256::from(10u64).pow(U256::from(30u64)),
        ])
    }

    #[test]
    fn test_ceiling_is_double_the_base_estimator() {
        let table = table();
        for kind in [OrderKind::Increase, OrderKind::Decrease, OrderKind::Swap] {
            let plan = GasPlan::new(table.base_limit(kind), 100);
            assert_eq!(plan.call_gas_ceiling, 2 * table.base_limit(kind));
            assert_eq!(plan.max_priority_fee_per_gas, 0);
        }
    }

    #[test]
    fn test_order_kinds_map_to_distinct_keys() {
        let keys = [
            order_gas_limit_key(OrderKind::Increase),
            order_gas_limit_key(OrderKind::Decrease),
            order_gas_limit_key(OrderKind::Swap),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
        assert_eq!(keys[0], config_key("INCREASE_ORDER_GAS_LIMIT"));
    }

    #[test]
    fn test_execution_fee_with_unit_multiplier() {
        // multiplier of exactly 10^30 means fee = (base + limit) * gas price
        let fee = execution_fee(
            U256::from(50u64),
            U256::from(10u64).pow(U256::from(30u64)),
            100,
            10,
            1.0,
        );
        assert_eq!(fee, U256::from(1500u64));
    }

    #[test]
    fn test_execution_fee_buffer() {
        let unbuffered = execution_fee(U256::ZERO, U256::from(10u64).pow(U256::from(30u64)), 100, 10, 1.0);
        let buffered = execution_fee(U256::ZERO, U256::from(10u64).pow(U256::from(30u64)), 100, 10, 1.3);
        assert_eq!(unbuffered, U256::from(1000u64));
        assert_eq!(buffered, U256::from(1300u64));
    }
}
