//! ERC-20 contract bindings (balance, allowance, approval)

use alloy::sol;

sol! {
    /// The slice of the ERC-20 interface the allowance manager needs
    #[sol(rpc)]
    interface IERC20 {
        /// Returns the balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Returns the remaining amount a spender may move for an owner
        function allowance(address owner, address spender) external view returns (uint256);

        /// Permits a spender to move up to `amount` tokens
        function approve(address spender, uint256 amount) external returns (bool);

        /// Emitted when an allowance is set
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}
