//! GmxClient - main entry point for the SDK

use crate::config::ChainConfig;
use crate::constants::BASE_FEE_MULTIPLIER;
use crate::contracts::{IDataStore, IERC20};
use crate::gas::{self, GasLimitTable, GasPlan};
use crate::oracle::OracleSnapshot;
use crate::registry::{MarketRegistry, TokenRegistry};
use crate::signer::TransactionSigner;
use crate::types::{OrderKind, TransactionEnvelope};
use alloy::eips::BlockNumberOrTag;
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::sync::Arc;

/// Type alias for read-only provider
type ReadProvider = Arc<RootProvider<Ethereum>>;

/// Main client for building and submitting orders.
///
/// Owns the signing credential, the chain configuration, and a read-only
/// provider used for every ledger read (balances, allowances, nonces, base
/// fee, datastore config).
pub struct GmxClient<S: TransactionSigner> {
    signer: S,
    config: ChainConfig,
    provider: ReadProvider,
}

impl<S: TransactionSigner> GmxClient<S> {
    /// Create a new GmxClient
    pub async fn new(signer: S, config: ChainConfig) -> Result<Self> {
        let url: Url = config.rpc_url.parse().context("Invalid RPC URL")?;
        // Read-only provider without fillers (we only do eth_call operations;
        // every write field is pinned explicitly before signing)
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<Ethereum>()
            .connect_http(url);

        Ok(Self {
            signer,
            config,
            provider: Arc::new(provider),
        })
    }

    /// Get the signer's address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain configuration
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub(crate) fn signer(&self) -> &S {
        &self.signer
    }

    // ========== Ledger reads ==========

    /// eth_call against an arbitrary contract
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Bytes> {
        self.provider
            .call(
                alloy::rpc::types::TransactionRequest::default()
                    .with_to(to)
                    .with_input(data),
            )
            .await
            .context("Contract call failed")
    }

    /// Native token balance of an account
    pub async fn get_native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .context("Failed to get native balance")
    }

    /// ERC-20 balance of an account
    pub async fn get_token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let call = IERC20::balanceOfCall { account: owner };
        let result = self
            .call(token, call.abi_encode())
            .await
            .context("Failed to call balanceOf")?;
        IERC20::balanceOfCall::abi_decode_returns(&result).context("Failed to decode balance")
    }

    /// Remaining ERC-20 allowance granted by `owner` to `spender`
    pub async fn get_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        let call = IERC20::allowanceCall { owner, spender };
        let result = self
            .call(token, call.abi_encode())
            .await
            .context("Failed to call allowance")?;
        IERC20::allowanceCall::abi_decode_returns(&result).context("Failed to decode allowance")
    }

    /// Next nonce for an account. Read immediately before assembly; a stale
    /// nonce is rejected by the gateway, not by this client.
    pub async fn get_nonce(&self, owner: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(owner)
            .await
            .context("Failed to get nonce")
    }

    /// Base fee per gas of the latest block
    pub async fn get_base_fee(&self) -> Result<u128> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .context("Failed to fetch latest block")?
            .ok_or_else(|| eyre::eyre!("Latest block unavailable"))?;
        let base_fee = block
            .header
            .base_fee_per_gas
            .ok_or_else(|| eyre::eyre!("Chain does not report a base fee"))?;
        Ok(base_fee as u128)
    }

    /// Current gas price
    pub async fn get_gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .context("Failed to get gas price")
    }

    /// Max fee per unit of gas: the caller's override, or 1.35x the current
    /// base fee
    pub async fn max_fee_per_gas(&self, fee_override: Option<u128>) -> Result<u128> {
        match fee_override {
            Some(fee) => Ok(fee),
            None => {
                let base_fee = self.get_base_fee().await?;
                Ok((base_fee as f64 * BASE_FEE_MULTIPLIER) as u128)
            }
        }
    }

    async fn datastore_uint(&self, key: B256) -> Result<U256> {
        let call = IDataStore::getUintCall { key };
        let result = self
            .call(self.config.datastore, call.abi_encode())
            .await
            .context("Failed to read datastore")?;
        IDataStore::getUintCall::abi_decode_returns(&result)
            .context("Failed to decode datastore value")
    }

    /// Read the full gas-limit table in one concurrent sweep
    pub async fn fetch_gas_limits(&self) -> Result<GasLimitTable> {
        let values = futures::future::try_join_all(
            gas::TABLE_KEYS
                .iter()
                .map(|name| self.datastore_uint(gas::config_key(name))),
        )
        .await?;
        Ok(GasLimitTable::from_values(&values))
    }

    /// Gas budget for one order kind: base estimator from the gas-limit
    /// table, doubled for the call-gas ceiling
    pub async fn gas_plan(&self, kind: OrderKind, fee_override: Option<u128>) -> Result<GasPlan> {
        let (table, max_fee) = futures::future::try_join(
            self.fetch_gas_limits(),
            self.max_fee_per_gas(fee_override),
        )
        .await?;
        Ok(GasPlan::new(table.base_limit(kind), max_fee))
    }

    /// Fetch the token registry, market registry, and oracle snapshot
    /// concurrently; resolution waits for all three
    pub async fn fetch_snapshots(
        &self,
    ) -> Result<(TokenRegistry, MarketRegistry, OracleSnapshot)> {
        futures::future::try_join3(
            TokenRegistry::fetch(self.config.chain),
            MarketRegistry::fetch(self.config.chain),
            OracleSnapshot::fetch(self.config.chain),
        )
        .await
    }

    // ========== Writes ==========

    /// Broadcast a raw signed transaction
    pub(crate) async fn submit_raw(&self, raw: &[u8]) -> Result<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .context("Failed to broadcast transaction")?;
        Ok(*pending.tx_hash())
    }

    /// Sign an envelope and broadcast it
    pub(crate) async fn sign_and_submit(&self, envelope: &TransactionEnvelope) -> Result<TxHash> {
        let raw = self.signer.sign(envelope).await?;
        self.submit_raw(&raw).await
    }
}
