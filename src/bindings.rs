//! Solidity interface bindings for the payment token, price oracle,
//! subscription, and coupon contracts.
//!
//! Declared inline: only the call surface is consumed here, the
//! contracts themselves live elsewhere.

use alloy::sol;

sol! {
    #[derive(Debug)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    #[derive(Debug)]
    interface IPriceOracle {
        function getLatestPriceUSD() external view returns (uint256);
        function requestPriceUpdate() external returns (bytes32);
    }

    #[derive(Debug)]
    interface IBondSubscription {
        function subscribe(uint256 amountInSmallestUnit) external;
        function redeem(uint256 amountInSmallestUnit) external;
        function issuer() external view returns (address);
        function getUserBalances(address user) external view returns (uint256 usdt, uint256 shares);
        function previewSubscription(uint256 amount)
            external
            view
            returns (uint256 sharesToReceive, uint256 actualUsdtNeeded, uint256 priceCents);
    }

    #[derive(Debug)]
    interface ICouponDistributor {
        function initializeClaim(address user) external;
        function canClaim(address user) external view returns (bool);
        function calculateCoupon(address user) external view returns (uint256);
        function claimCoupon() external;
        function getNextClaimTime(address user) external view returns (uint256);
    }
}
