//! DataStore contract bindings
//!
//! The datastore is the protocol's on-chain configuration registry; the SDK
//! only reads unsigned integers from it (the gas-limit table).

use alloy::sol;

sol! {
    /// DataStore read interface
    #[sol(rpc)]
    interface IDataStore {
        /// Read a uint config value by its keccak key
        function getUint(bytes32 key) external view returns (uint256);
    }
}
