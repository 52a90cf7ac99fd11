//! Fixed-precision snapping for asset amounts and fiat values.
//!
//! Every mutation of holdings or price is rounded immediately so that
//! repeated runs over the same plan produce identical series.

/// Fractional digits kept for asset amounts (one satoshi).
pub const ASSET_DECIMALS: i32 = 8;

/// Fractional digits kept for fiat amounts and prices.
pub const FIAT_DECIMALS: i32 = 2;

/// Smallest representable fiat amount; the floor for any price.
pub const FIAT_MINOR_UNIT: f64 = 0.01;

/// Round `value` to `decimals` fractional digits, half away from zero.
pub fn snap(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let snapped = (value * scale).round() / scale;
    // Avoid -0.0 leaking into the series.
    if snapped == 0.0 {
        0.0
    } else {
        snapped
    }
}

pub fn snap_asset(value: f64) -> f64 {
    snap(value, ASSET_DECIMALS)
}

pub fn snap_fiat(value: f64) -> f64 {
    snap(value, FIAT_DECIMALS)
}
