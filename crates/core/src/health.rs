//! Borrower health metrics.
//!
//! Everything here is a pure function of the asset registry and the
//! borrower's balances. All derived fields are rewritten from scratch on
//! every call.

use alloy::primitives::Address;
use std::collections::HashMap;

use crate::snapshot::{AssetMap, BorrowerPosition};
use crate::u256_math::round_to;

/// Decimal places kept in `percent_to_liquidation`.
pub const PERCENT_PRECISION: u8 = 5;

/// Recompute the derived fields of every borrower.
pub fn recompute_health(assets: &AssetMap, borrowers: &mut HashMap<Address, BorrowerPosition>) {
    for position in borrowers.values_mut() {
        compute_health(assets, position);
    }
}

/// Recompute the derived fields of one borrower.
///
/// Limits are expressed in base asset units. A borrower whose liquidation
/// limit is zero is infinitely past liquidation.
pub fn compute_health(assets: &AssetMap, position: &mut BorrowerPosition) {
    let base_price = assets.base().map(|a| a.price).unwrap_or_default();
    let borrow_value = position.borrow_balance * base_price;

    let mut borrow_limit = 0.0;
    let mut liquidation_limit = 0.0;
    for (symbol, amount) in &position.collaterals {
        let Some(asset) = assets.get(symbol) else {
            continue;
        };
        borrow_limit += amount * asset.collateral_factor.unwrap_or_default() * asset.price;
        liquidation_limit += amount * asset.liquidation_factor.unwrap_or_default() * asset.price;
    }

    let (borrow_limit, liquidation_limit_base) = if base_price > 0.0 {
        (borrow_limit / base_price, liquidation_limit / base_price)
    } else {
        (0.0, 0.0)
    };

    position.borrow_limit = borrow_limit;
    position.liquidation_limit = liquidation_limit_base;
    position.percent_to_liquidation = if liquidation_limit > 0.0 {
        round_to(borrow_value / liquidation_limit * 100.0, PERCENT_PRECISION)
    } else {
        f64::INFINITY
    };

    position.liquidation_price = match position.collaterals.iter().next() {
        Some((symbol, amount)) if position.collaterals.len() == 1 => assets
            .get(symbol)
            .and_then(|asset| asset.liquidation_factor)
            .map(|lcf| borrow_value / amount / lcf),
        _ => None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::{asset, collateral, USDC, WBTC, WETH};
    use std::collections::BTreeMap;

    fn registry() -> AssetMap {
        let mut assets = AssetMap::new();
        assets.insert(asset("USDC", USDC, 6, 1.0));
        assets.insert(collateral("WETH", WETH, 18, 0.6, 0.8, 0.9));
        assets.insert(collateral("WBTC", WBTC, 8, 2.0, 0.7, 0.75));
        assets
    }

    fn position(borrow: f64, collaterals: &[(&str, f64)]) -> BorrowerPosition {
        let collaterals: BTreeMap<_, _> = collaterals
            .iter()
            .map(|(s, a)| (s.to_string(), *a))
            .collect();
        BorrowerPosition::new(false, borrow, collaterals)
    }

    #[test]
    fn test_single_collateral_scenario() {
        let assets = registry();
        let mut p = position(100.0, &[("WETH", 200.0)]);
        compute_health(&assets, &mut p);

        assert!((p.borrow_limit - 96.0).abs() < 1e-9);
        assert!((p.liquidation_limit - 108.0).abs() < 1e-9);
        assert_eq!(p.percent_to_liquidation, 92.59259);
        let price = p.liquidation_price.unwrap();
        assert_eq!(round_to(price, 5), 0.55556);
    }

    #[test]
    fn test_multi_collateral_has_no_liquidation_price() {
        let assets = registry();
        let mut p = position(100.0, &[("WETH", 100.0), ("WBTC", 10.0)]);
        compute_health(&assets, &mut p);

        assert!(p.liquidation_price.is_none());
        // 100*0.8*0.6 + 10*0.7*2
        assert!((p.borrow_limit - 62.0).abs() < 1e-9);
        // 100*0.9*0.6 + 10*0.75*2
        assert!((p.liquidation_limit - 69.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_is_scale_invariant() {
        let assets = registry();
        let mut base = position(73.0, &[("WETH", 100.0), ("WBTC", 10.0)]);
        compute_health(&assets, &mut base);

        for factor in [0.001, 3.0, 1234.5] {
            let mut scaled = position(73.0 * factor, &[("WETH", 100.0 * factor), ("WBTC", 10.0 * factor)]);
            compute_health(&assets, &mut scaled);
            assert!((scaled.percent_to_liquidation - base.percent_to_liquidation).abs() < 1e-4);
        }
    }

    #[test]
    fn test_base_price_normalises_limits() {
        let mut assets = registry();
        assets.set_price(0, 2.0);
        let mut p = position(100.0, &[("WETH", 200.0)]);
        compute_health(&assets, &mut p);

        assert!((p.borrow_limit - 48.0).abs() < 1e-9);
        assert!((p.liquidation_limit - 54.0).abs() < 1e-9);
        // 200 / 108
        assert_eq!(p.percent_to_liquidation, 185.18519);
    }

    #[test]
    fn test_no_collateral_is_infinite() {
        let assets = registry();
        let mut p = position(5.0, &[]);
        compute_health(&assets, &mut p);
        assert!(p.percent_to_liquidation.is_infinite());
        assert!(p.liquidation_price.is_none());
    }

    #[test]
    fn test_recompute_replaces_stale_fields() {
        let assets = registry();
        let mut p = position(100.0, &[("WETH", 100.0), ("WBTC", 10.0)]);
        p.liquidation_price = Some(1.0);
        p.borrow_limit = 1e9;

        let mut borrowers = HashMap::from([(Address::ZERO, p)]);
        recompute_health(&assets, &mut borrowers);

        let p = &borrowers[&Address::ZERO];
        assert!(p.liquidation_price.is_none());
        assert!((p.borrow_limit - 62.0).abs() < 1e-9);
    }
}
