//! Volume conversions.
//!
//! Stored volumes are single bytes on a fitted, non-linear decibel curve.
//! Playback volume is composed by summing decibel quantities and converting
//! the sum to an amplitude ratio once. The two conversions are not inverses
//! of each other and must not be merged.

/// Convert a stored volume byte to decibels.
///
/// `0` maps to -96 dB (silence); `255` maps to roughly +6 dB.
pub fn parse_decibel(binary: u8) -> f64 {
    const FLOOR: f64 = -96.0;
    const CEILING: f64 = 67.738_521_233_404_7;
    const SCALE: f64 = 80.174_860_029_796_3;
    const EXPONENT: f64 = 0.432_254_984_608_615;

    ((FLOOR - CEILING) / (1.0 + (f64::from(binary) / SCALE).powf(EXPONENT))) + CEILING
}

/// Convert a decibel quantity to a linear amplitude ratio (`10^(dB/20)`).
pub fn amplitude_ratio(decibel: f64) -> f32 {
    10f64.powf(decibel / 20.0) as f32
}
