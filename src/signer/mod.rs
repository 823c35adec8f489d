//! Transaction signer abstraction
//!
//! Trait seam over the signing credential, so the pipeline can work with a
//! local private key or an external signing service without caring which.

mod local;

pub use local::LocalSigner;

use crate::types::TransactionEnvelope;
use alloy::primitives::{Address, Bytes};
use eyre::Result;

/// Holder of the signing credential.
///
/// One sign call consumes one fully-specified envelope; the envelope is
/// immutable once signed. Concurrent use of the same credential is safe only
/// when each envelope carries its own freshly-read nonce.
pub trait TransactionSigner: Send + Sync {
    /// The signer's EVM address
    fn address(&self) -> Address;

    /// Sign a fully-specified envelope, returning the raw encoded transaction
    fn sign(
        &self,
        envelope: &TransactionEnvelope,
    ) -> impl std::future::Future<Output = Result<Bytes>> + Send;
}
