//! Token allowance verification and approval
//!
//! Runs before any order that moves collateral: checks the owner can fund
//! the amount, then that the spender may move it, raising the allowance by
//! exactly the required amount when asked to.

use crate::client::GmxClient;
use crate::constants::APPROVAL_GAS_LIMIT;
use crate::contracts::IERC20;
use crate::error::OrderError;
use crate::registry::{BRIDGED_BTC, SYNTHETIC_BTC};
use crate::signer::TransactionSigner;
use crate::types::TransactionEnvelope;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use tracing::{debug, info};

/// Compatibility shim: the synthetic BTC index address is not an ERC-20;
/// balance and allowance queries go to the bridged token instead. One entry,
/// on purpose; do not generalize.
pub(crate) fn remap_legacy_token(token: Address) -> Address {
    if token == SYNTHETIC_BTC {
        BRIDGED_BTC
    } else {
        token
    }
}

/// What the allowance state calls for, given the reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AllowancePlan {
    /// Current allowance already covers the amount; nothing to do
    Sufficient,
    /// Approve exactly this amount (least privilege, never unlimited)
    Approve(U256),
    /// Too low and auto-approval disabled; the caller must approve out of band
    Rejected,
}

pub(crate) fn plan_allowance(allowance: U256, required: U256, auto_approve: bool) -> AllowancePlan {
    if allowance >= required {
        AllowancePlan::Sufficient
    } else if auto_approve {
        AllowancePlan::Approve(required)
    } else {
        AllowancePlan::Rejected
    }
}

impl<S: TransactionSigner> GmxClient<S> {
    /// Verify the signer can fund `required_amount` of `token` and that
    /// `spender` is allowed to move it.
    ///
    /// No-op when the allowance is already sufficient, so repeating the call
    /// issues at most one approval. The approval, when taken, is submitted
    /// and accepted by the gateway before this returns; finality is not
    /// awaited.
    pub async fn ensure_allowance(
        &self,
        spender: Address,
        token: Address,
        required_amount: U256,
        max_fee_per_gas: u128,
        auto_approve: bool,
    ) -> Result<(), OrderError> {
        let token = remap_legacy_token(token);
        let owner = self.address();

        // native balance for the wrapped-native token, ERC-20 balance otherwise
        let balance = if token == self.config().wrapped_native {
            self.get_native_balance(owner).await
        } else {
            self.get_token_balance(token, owner).await
        }
        .map_err(OrderError::submission)?;

        if balance < required_amount {
            return Err(OrderError::InsufficientBalance {
                token,
                balance,
                required: required_amount,
            });
        }

        let allowance = self
            .get_allowance(token, owner, spender)
            .await
            .map_err(OrderError::submission)?;

        match plan_allowance(allowance, required_amount, auto_approve) {
            AllowancePlan::Sufficient => {
                debug!(%token, %spender, %allowance, "allowance already sufficient");
                Ok(())
            }
            AllowancePlan::Rejected => Err(OrderError::AllowanceTooLow {
                token,
                spender,
                allowance,
                required: required_amount,
            }),
            AllowancePlan::Approve(amount) => {
                info!(%token, %spender, %amount, "raising allowance");
                let call = IERC20::approveCall { spender, amount };
                let nonce = self.get_nonce(owner).await.map_err(OrderError::submission)?;
                let envelope = TransactionEnvelope {
                    to: token,
                    data: Bytes::from(call.abi_encode()),
                    value: U256::ZERO,
                    chain_id: self.config().chain_id,
                    gas_limit: APPROVAL_GAS_LIMIT,
                    max_fee_per_gas,
                    max_priority_fee_per_gas: 0,
                    nonce,
                };
                let tx_hash = self
                    .sign_and_submit(&envelope)
                    .await
                    .map_err(OrderError::submission)?;
                info!(%tx_hash, "approval submitted");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_legacy_token_remap() {
        assert_eq!(remap_legacy_token(SYNTHETIC_BTC), BRIDGED_BTC);
        // every other address passes through untouched
        let weth = address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1");
        assert_eq!(remap_legacy_token(weth), weth);
        assert_eq!(remap_legacy_token(BRIDGED_BTC), BRIDGED_BTC);
    }

    #[test]
    fn test_sufficient_allowance_is_a_no_op() {
        let required = U256::from(1_000u64);
        // equal and above both skip the approval, making repeat calls idempotent
        assert_eq!(
            plan_allowance(required, required, true),
            AllowancePlan::Sufficient
        );
        assert_eq!(
            plan_allowance(U256::from(2_000u64), required, false),
            AllowancePlan::Sufficient
        );
    }

    #[test]
    fn test_approval_is_exact_amount() {
        let required = U256::from(1_000u64);
        match plan_allowance(U256::ZERO, required, true) {
            AllowancePlan::Approve(amount) => assert_eq!(amount, required),
            other => panic!("expected approval, got {other:?}"),
        }
    }

    #[test]
    fn test_low_allowance_without_auto_approve_is_rejected() {
        assert_eq!(
            plan_allowance(U256::from(999u64), U256::from(1_000u64), false),
            AllowancePlan::Rejected
        );
    }
}
