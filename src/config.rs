//! Centralized runtime constants for probecraft.
//!
//! All tunable intervals, counts, and thresholds are collected here so they
//! can be found and adjusted in a single place rather than scattered across
//! modules.

/// Number of ARP discovery retries before giving up on gateway resolution.
pub const ARP_MAX_RETRIES: u32 = 5;

/// Capture window per ARP retry (seconds).
pub const ARP_RETRY_TIMEOUT_SECS: u64 = 1;

/// Poll timeout used by the receiver worker when no frame is pending (milliseconds).
pub const CAPTURE_POLL_INTERVAL_MS: u64 = 10;

/// Interval at which the status line refreshes progress, rate, and counters (milliseconds).
pub const STATUS_REFRESH_INTERVAL_MS: u64 = 250;

/// Number of Feistel rounds used by the target/port shuffle.
pub const SHUFFLE_ROUNDS: u32 = 4;

/// Multiplier applied to the configured rate to size the token bucket's burst capacity.
pub const RATE_BUCKET_CAP_FACTOR: f64 = 0.1;

/// Seconds the status line keeps consuming captures after the probe count is
/// exhausted, waiting for in-flight replies, before signalling full shutdown.
pub const DEFAULT_WAIT_SECS: u64 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_intervals_positive() {
        assert!(ARP_MAX_RETRIES > 0);
        assert!(ARP_RETRY_TIMEOUT_SECS > 0);
        assert!(CAPTURE_POLL_INTERVAL_MS > 0);
        assert!(STATUS_REFRESH_INTERVAL_MS > 0);
        assert!(SHUFFLE_ROUNDS > 0);
        assert!(RATE_BUCKET_CAP_FACTOR > 0.0);
        assert!(DEFAULT_WAIT_SECS > 0);
    }
}
