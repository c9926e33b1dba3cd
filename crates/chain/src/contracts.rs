//! Contract bindings for the Comet market, ERC-20 metadata and Multicall3.
//!
//! Only the read surface the monitor needs is declared here.

use alloy::primitives::{address, Address};
use alloy::sol;

/// Canonical Multicall3 deployment, identical on every supported chain.
pub const MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Scale of Comet collateral factors (18 decimals).
pub const FACTOR_SCALE_DECIMALS: u8 = 18;

/// Scale of Comet `getPrice` results (8 decimals).
pub const PRICE_SCALE_DECIMALS: u8 = 8;

sol! {
    /// Per-asset configuration as returned by `getAssetInfo`.
    #[derive(Debug)]
    struct AssetInfo {
        uint8 offset;
        address asset;
        address priceFeed;
        uint64 scale;
        uint64 borrowCollateralFactor;
        uint64 liquidateCollateralFactor;
        uint64 liquidationFactor;
        uint128 supplyCap;
    }

    /// Comet (Compound III) market interface, read subset.
    #[sol(rpc)]
    interface IComet {
        event Withdraw(address indexed src, address indexed to, uint256 amount);

        function numAssets() external view returns (uint8);
        function getAssetInfo(uint8 i) external view returns (AssetInfo memory);
        function getPrice(address priceFeed) external view returns (uint256);
        function isLiquidatable(address account) external view returns (bool);
        function borrowBalanceOf(address account) external view returns (uint256);
        function collateralBalanceOf(address account, address asset) external view returns (uint128);
    }

    /// ERC-20 metadata.
    #[sol(rpc)]
    interface IERC20Metadata {
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
    }

    #[derive(Debug)]
    struct Call3 {
        address target;
        bool allowFailure;
        bytes callData;
    }

    #[derive(Debug)]
    struct Call3Result {
        bool success;
        bytes returnData;
    }

    /// Multicall3 aggregation entry point.
    #[sol(rpc)]
    interface IMulticall3 {
        function aggregate3(Call3[] calldata calls) external payable returns (Call3Result[] memory returnData);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{SolCall, SolEvent};

    #[test]
    fn test_withdraw_signature() {
        assert_eq!(
            IComet::Withdraw::SIGNATURE,
            "Withdraw(address,address,uint256)"
        );
    }

    #[test]
    fn test_aggregate3_selector() {
        // aggregate3((address,bool,bytes)[])
        assert_eq!(IMulticall3::aggregate3Call::SELECTOR, [0x82, 0xad, 0x56, 0xcb]);
    }
}
