//! Contract bindings for the GMX v2 protocol

pub mod datastore;
pub mod erc20;
pub mod exchange_router;

pub use datastore::*;
pub use erc20::*;
pub use exchange_router::*;
