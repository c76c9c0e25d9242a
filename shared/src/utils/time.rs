//! Tick/time conversions

/// Convert a pair of device ticks to elapsed milliseconds.
///
/// The tick delta is taken in integer space and the division done in `f64`
/// so large absolute tick counts do not lose precision. A zero frequency
/// yields 0.0 rather than infinity.
pub fn ticks_to_millis(begin_ticks: u64, end_ticks: u64, ticks_per_second: u64) -> f64 {
    if ticks_per_second == 0 {
        return 0.0;
    }
    let delta = end_ticks.wrapping_sub(begin_ticks) as f64;
    1000.0 * delta / ticks_per_second as f64
}

/// Convert milliseconds to a whole number of ticks at the given frequency
pub fn millis_to_ticks(millis: f64, ticks_per_second: u64) -> u64 {
    (millis * ticks_per_second as f64 / 1000.0).round().max(0.0) as u64
}
