//! ExchangeRouter contract bindings
//!
//! Order creation goes through a single multicall on the router: a native
//! transfer covering the keeper execution fee, an optional collateral
//! transfer, and the `createOrder` call itself.

use alloy::sol;

sol! {
    /// Address section of the order parameters
    #[derive(Debug, Default)]
    struct CreateOrderParamsAddresses {
        address receiver;
        address cancellationReceiver;
        address callbackContract;
        address uiFeeReceiver;
        address market;
        address initialCollateralToken;
        address[] swapPath;
    }

    /// Numeric section of the order parameters
    #[derive(Debug, Default)]
    struct CreateOrderParamsNumbers {
        uint256 sizeDeltaUsd;               // USD size change (30 decimals)
        uint256 initialCollateralDeltaAmount; // collateral in token units
        uint256 triggerPrice;               // 0 for market orders
        uint256 acceptablePrice;            // slippage-bounded execution price
        uint256 executionFee;               // native amount escrowed for the keeper
        uint256 callbackGasLimit;
        uint256 minOutputAmount;
        uint256 validFromTime;
    }

    /// Full order parameters; orderType and decreasePositionSwapType are the
    /// protocol's enums, ABI-encoded as uint8
    #[derive(Debug, Default)]
    struct CreateOrderParams {
        CreateOrderParamsAddresses addresses;
        CreateOrderParamsNumbers numbers;
        uint8 orderType;
        uint8 decreasePositionSwapType;
        bool isLong;
        bool shouldUnwrapNativeToken;
        bool autoCancel;
        bytes32 referralCode;
    }

    /// ExchangeRouter interface
    #[sol(rpc)]
    interface IExchangeRouter {
        /// Batch several router calls into one atomic transaction
        function multicall(bytes[] calldata data) external payable returns (bytes[] memory results);

        /// Forward wrapped-native value to a receiver (the order vault)
        function sendWnt(address receiver, uint256 amount) external payable;

        /// Forward ERC-20 tokens to a receiver (the order vault)
        function sendTokens(address token, address receiver, uint256 amount) external payable;

        /// Create an order from escrowed funds
        function createOrder(CreateOrderParams calldata params) external payable returns (bytes32);
    }
}

/// Protocol order type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OrderType {
    /// Swap at the current price
    #[default]
    MarketSwap = 0,
    /// Swap once a trigger price is reached
    LimitSwap = 1,
    /// Open/grow a position at the current price
    MarketIncrease = 2,
    /// Open/grow once a trigger price is reached
    LimitIncrease = 3,
    /// Close/shrink a position at the current price
    MarketDecrease = 4,
    /// Close/shrink once a trigger price is reached
    LimitDecrease = 5,
    /// Stop-loss close
    StopLossDecrease = 6,
    /// Forced close by the liquidation keeper
    Liquidation = 7,
}

impl From<OrderType> for u8 {
    fn from(order_type: OrderType) -> u8 {
        order_type as u8
    }
}

/// How realized PnL is swapped when a position is decreased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DecreasePositionSwapType {
    #[default]
    NoSwap = 0,
    SwapPnlTokenToCollateralToken = 1,
    SwapCollateralTokenToPnlToken = 2,
}

impl From<DecreasePositionSwapType> for u8 {
    fn from(swap_type: DecreasePositionSwapType) -> u8 {
        swap_type as u8
    }
}
