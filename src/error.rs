//! Error types for the GMX SDK
//!
//! Plumbing (provider calls, HTTP fetches, signing) uses `eyre` with context.
//! The order pipeline's public contracts return [`OrderError`], a closed
//! taxonomy of rejection reasons; every variant names what failed and the
//! observed vs required values, since these guards exist to stop an invalid
//! transaction before it reaches the ledger.

use crate::resolver::RequiredField;
use alloy::primitives::{Address, U256};

pub use eyre::{Context, Report};

/// Result alias for the order pipeline
pub type Result<T, E = OrderError> = std::result::Result<T, E>;

/// Rejection reasons surfaced by the order pipeline.
///
/// None of these are retried internally: resubmitting with a new nonce is a
/// caller decision, since a blind retry risks duplicate intent.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The request was incomplete and the missing fields could not be derived
    #[error("missing required fields: {fields:?}")]
    MissingField { fields: Vec<RequiredField> },

    /// Pre-flight balance check failed; no on-chain call was attempted
    #[error("insufficient balance of token {token}: have {balance}, need {required}")]
    InsufficientBalance {
        token: Address,
        balance: U256,
        required: U256,
    },

    /// Allowance is insufficient and auto-approval was not enabled
    #[error(
        "allowance for spender {spender} on token {token} too low: \
         have {allowance}, need {required}"
    )]
    AllowanceTooLow {
        token: Address,
        spender: Address,
        allowance: U256,
        required: U256,
    },

    /// Collateral backing the position is below the venue minimum
    #[error("initial collateral worth {collateral_usd:.4} USD is below the {minimum_usd} USD minimum")]
    CollateralTooLow {
        collateral_usd: f64,
        minimum_usd: f64,
    },

    /// Implied leverage exceeds the venue maximum
    #[error("implied leverage {requested:.2}x exceeds the venue maximum {maximum:.0}x")]
    LeverageExceeded { requested: f64, maximum: f64 },

    /// The oracle snapshot has no entry for the token
    #[error("no oracle price for token {token}")]
    PriceUnavailable { token: Address },

    /// The gateway rejected a signed transaction, or a gateway call failed
    /// with no more specific kind above
    #[error("transaction submission failed: {reason}")]
    SubmissionFailed { reason: String },
}

impl OrderError {
    /// Wrap a gateway or signing failure, keeping the full context chain
    pub fn submission(err: Report) -> Self {
        Self::SubmissionFailed {
            reason: format!("{err:#}"),
        }
    }
}
