//! Unit conversion utilities
//!
//! G-Code `F` words are millimetres per minute while firmware speed limits
//! (`M203`) and slicer settings are millimetres per second.

/// Convert mm/s to mm/min
pub fn mm_per_sec_to_mm_per_min(value: f64) -> f64 {
    value * 60.0
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, precision: u32) -> f64 {
    let multiplier = 10f64.powi(precision as i32);
    (value * multiplier).round() / multiplier
}
