//! Precision policies.
//!
//! Pixel geometry is computed in `f64` and only rounded when it is serialized
//! (path data, SVG attributes). Rounding goes through [`quantize_f64`] so the
//! output is stable across platforms and never prints `-0`.

/// Canonicalize a floating-point value for deterministic output.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Round to `decimals` fractional digits, then canonicalize.
pub fn quantize_f64(v: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    canonical_f64((v * scale).round() / scale)
}
