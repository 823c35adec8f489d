//! GMX SDK for Rust
//!
//! A Rust SDK for constructing, signing, and submitting GMX v2 orders
//! (perpetual positions and token swaps) on Arbitrum.
//!
//! # Features
//!
//! - Resolve partial order requests against the venue's token and market registries
//! - Slippage-bounded execution prices from the signed oracle feed
//! - Gas budgeting from the on-chain gas-limit table
//! - Allowance pre-flight with optional least-privilege auto-approval
//! - Simulate mode: full assembly and signing without broadcast
//!
//! # Example
//!
//! ```rust,ignore
//! use gmx_sdk::{Chain, ChainConfig, GmxClient, LocalSigner, OrderRequest, SubmitOptions};
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let config = ChainConfig::arbitrum();
//!     let signer = LocalSigner::from_env()?;
//!     let client = GmxClient::new(signer, config).await?;
//!
//!     // Long BTC with 50 USDC of collateral at 20x
//!     let request = OrderRequest::increase()
//!         .with_chain(Chain::Arbitrum)
//!         .with_index_token_symbol("BTC")
//!         .with_start_token_symbol("USDC")
//!         .long()
//!         .with_size_delta_usd(1000.0)
//!         .with_initial_collateral_delta(50.0)
//!         .with_slippage(0.003);
//!
//!     let resolved = client.resolve_order(&request).await?;
//!     let outcome = client
//!         .build_and_submit(&resolved, &SubmitOptions::default())
//!         .await?;
//!     println!("{outcome:?}");
//!
//!     Ok(())
//! }
//! ```

pub mod allowance;
pub mod builder;
pub mod client;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod error;
pub mod gas;
pub mod oracle;
pub mod pricing;
pub mod registry;
pub mod resolver;
pub mod signer;
pub mod types;

// Re-export main types for convenience
pub use builder::{assemble_envelope, BuildContext, SubmitOptions};
pub use client::GmxClient;
pub use config::{Chain, ChainConfig};
pub use error::{OrderError, Result};
pub use gas::{GasLimitTable, GasPlan};
pub use oracle::{OracleSnapshot, PriceQuote};
pub use pricing::{execution_price, ExecutionPrice, PriceIntent};
pub use registry::{MarketInfo, MarketRegistry, TokenInfo, TokenRegistry};
pub use resolver::{RequiredField, Resolver};
pub use signer::{LocalSigner, TransactionSigner};
pub use types::{
    OrderKind, OrderRequest, ResolvedOrder, SubmitMode, SubmitOutcome, TransactionEnvelope,
};
