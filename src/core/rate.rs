//! Counter-delta to throughput conversion.

/// Seconds per device uptime tick. SNMP TimeTicks are hundredths of a second.
pub const TICK_SECONDS: f64 = 0.01;

/// Compute a throughput in bytes per second from two successive counter
/// samples and the elapsed device ticks between them.
///
/// Returns `None` (no baseline) when:
/// - there is no previous sample for the counter,
/// - `elapsed_ticks` is zero or negative (device restart or clock
///   discontinuity),
/// - the counter went backwards (wrap or device reset).
///
/// Callers must treat `None` as "re-baseline silently": no threshold
/// evaluation, no alert, the current sample simply becomes the new baseline.
pub fn rate(prev: Option<u64>, curr: u64, elapsed_ticks: i64) -> Option<f64> {
    let prev = prev?;
    if elapsed_ticks <= 0 {
        return None;
    }
    if curr < prev {
        return None;
    }
    Some((curr - prev) as f64 / (elapsed_ticks as f64 * TICK_SECONDS))
}
