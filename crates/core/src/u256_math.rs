//! Fixed-point to floating-point conversion for on-chain integers.
//!
//! Raw balances, prices and factors stay integers until they are normalised
//! here. Conversion walks the limbs directly instead of going through
//! `String`.

use alloy::primitives::U256;

/// 2^64 as f64, the weight of one limb.
const LIMB_BASE: f64 = 18_446_744_073_709_551_616.0;

/// Convert a U256 to the nearest f64.
#[inline(always)]
pub fn u256_to_f64(value: U256) -> f64 {
    if value <= U256::from(u128::MAX) {
        let value: u128 = value.to();
        value as f64
    } else {
        value
            .as_limbs()
            .iter()
            .rev()
            .fold(0.0, |acc, &limb| acc * LIMB_BASE + limb as f64)
    }
}

/// Divide a raw integer by 10^decimals.
#[inline(always)]
pub fn scale_down(value: U256, decimals: u8) -> f64 {
    u256_to_f64(value) / 10f64.powi(decimals as i32)
}

/// Divide a raw u128 by 10^decimals.
#[inline(always)]
pub fn scale_down_u128(value: u128, decimals: u8) -> f64 {
    value as f64 / 10f64.powi(decimals as i32)
}

/// Round to a fixed number of decimal places. Non-finite values pass through.
#[inline(always)]
pub fn round_to(value: f64, places: u8) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_to_f64_small() {
        assert_eq!(u256_to_f64(U256::ZERO), 0.0);
        assert_eq!(u256_to_f64(U256::from(1_000_000u64)), 1_000_000.0);
    }

    #[test]
    fn test_u256_to_f64_beyond_u128() {
        let value = U256::from(u128::MAX) * U256::from(4u64);
        let expected = u128::MAX as f64 * 4.0;
        assert!((u256_to_f64(value) - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_scale_down() {
        // 1500 USDC (6 decimals)
        assert!((scale_down(U256::from(1_500_000_000u64), 6) - 1500.0).abs() < 1e-9);
        // 0.8 as an 18-decimal factor
        let factor = U256::from(800_000_000_000_000_000u64);
        assert!((scale_down(factor, 18) - 0.8).abs() < 1e-12);
        // 2.5 WBTC (8 decimals)
        assert!((scale_down_u128(250_000_000, 8) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(92.592592592, 5), 92.59259);
        assert_eq!(round_to(0.123456, 2), 0.12);
        assert!(round_to(f64::INFINITY, 5).is_infinite());
    }
}
