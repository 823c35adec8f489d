//! Local private key signer

use super::TransactionSigner;
use crate::types::TransactionEnvelope;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::signers::local::PrivateKeySigner;
use eyre::{Context, Result};

/// Signer backed by a raw EVM private key held in memory
pub struct LocalSigner {
    wallet: EthereumWallet,
    address: Address,
}

impl LocalSigner {
    /// Create a signer from a hex-encoded private key (with or without the
    /// 0x prefix)
    pub fn from_private_key(private_key: impl AsRef<str>) -> Result<Self> {
        let key = private_key.as_ref();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;
        let address = signer.address();

        Ok(Self {
            wallet: EthereumWallet::from(signer),
            address,
        })
    }

    /// Read the key from the `PRIVATE_KEY` environment variable, honoring a
    /// local `.env` file
    pub fn from_env() -> Result<Self> {
        let key = dotenvy::var("PRIVATE_KEY").context("PRIVATE_KEY not set")?;
        Self::from_private_key(key)
    }
}

impl TransactionSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, envelope: &TransactionEnvelope) -> Result<Bytes> {
        let request = envelope.to_request();
        let signed = request
            .build(&self.wallet)
            .await
            .context("Failed to sign transaction")?;
        Ok(signed.encoded_2718().into())
    }
}
