//! Asset registry loading.
//!
//! The base asset comes from static configuration and is always first.
//! Collateral assets are enumerated from the market by index, then resolved
//! to symbol and decimals through their own ERC-20 metadata.

use comet_monitor_chain::{MarketReader, FACTOR_SCALE_DECIMALS};
use tracing::debug;

use crate::config::BaseAsset;
use crate::error::Result;
use crate::snapshot::{Asset, AssetMap};
use crate::u256_math::scale_down_u128;

/// Load the full asset registry for a market with `count` collateral assets.
///
/// Any failing read aborts the load; the caller keeps its previous registry.
/// Prices are left at zero for the price refresher to fill.
pub async fn load_registry(
    reader: &dyn MarketReader,
    base: &BaseAsset,
    count: u8,
) -> Result<AssetMap> {
    let mut assets = AssetMap::new();
    assets.insert(Asset {
        symbol: base.symbol.clone(),
        address: base.address,
        decimals: base.decimals,
        price_feed: base.price_feed,
        price: 0.0,
        collateral_factor: None,
        liquidation_factor: None,
    });

    for index in 0..count {
        let info = reader.collateral_info(index).await?;
        let metadata = reader.token_metadata(info.asset).await?;

        let collateral_factor =
            scale_down_u128(info.borrow_collateral_factor as u128, FACTOR_SCALE_DECIMALS);
        let liquidation_factor =
            scale_down_u128(info.liquidate_collateral_factor as u128, FACTOR_SCALE_DECIMALS);

        debug!(
            index,
            symbol = %metadata.symbol,
            asset = %info.asset,
            decimals = metadata.decimals,
            collateral_factor,
            liquidation_factor,
            "Loaded collateral asset"
        );

        assets.insert(Asset {
            symbol: metadata.symbol,
            address: info.asset,
            decimals: metadata.decimals,
            price_feed: info.price_feed,
            price: 0.0,
            collateral_factor: Some(collateral_factor),
            liquidation_factor: Some(liquidation_factor),
        });
    }

    Ok(assets)
}
