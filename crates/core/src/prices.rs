//! Oracle price refresh.

use comet_monitor_chain::{MarketReader, PRICE_SCALE_DECIMALS};
use tracing::debug;

use crate::error::Result;
use crate::snapshot::AssetMap;
use crate::u256_math::scale_down;

/// Fetch the current price of every asset, base included.
///
/// Prices are collected first and written only once every read succeeded,
/// so a failure leaves `assets` untouched.
pub async fn refresh_prices(reader: &dyn MarketReader, assets: &mut AssetMap) -> Result<()> {
    let mut prices = Vec::with_capacity(assets.len());
    for asset in assets.iter() {
        let raw = reader.price(asset.price_feed).await?;
        let price = scale_down(raw, PRICE_SCALE_DECIMALS);
        debug!(symbol = %asset.symbol, price, "Refreshed price");
        prices.push(price);
    }

    for (index, price) in prices.into_iter().enumerate() {
        assets.set_price(index, price);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailPoint, MockReader};
    use crate::snapshot::tests::{asset, collateral, USDC, WETH};

    fn registry() -> AssetMap {
        let mut assets = AssetMap::new();
        assets.insert(asset("USDC", USDC, 6, 0.0));
        assets.insert(collateral("WETH", WETH, 18, 0.0, 0.83, 0.9));
        assets
    }

    #[tokio::test]
    async fn test_prices_normalised_in_place() {
        let mut assets = registry();
        let reader = MockReader::new(1);
        reader.set_price(assets.get("USDC").unwrap().price_feed, 0.99995);
        reader.set_price(assets.get("WETH").unwrap().price_feed, 3125.5);

        refresh_prices(&reader, &mut assets).await.unwrap();

        assert!((assets.get("USDC").unwrap().price - 0.99995).abs() < 1e-9);
        let weth = assets.get("WETH").unwrap();
        assert!((weth.price - 3125.5).abs() < 1e-9);
        // Identity and factors are untouched
        assert_eq!(weth.address, WETH);
        assert_eq!(weth.collateral_factor, Some(0.83));
        assert_eq!(MockReader::count(&reader.price_calls), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_prices_untouched() {
        let mut assets = registry();
        assets.set_price(1, 2000.0);
        let before = assets.clone();

        let reader = MockReader::new(1);
        reader.fail_at(FailPoint::Price);
        assert!(refresh_prices(&reader, &mut assets).await.is_err());
        assert_eq!(assets, before);
    }
}
