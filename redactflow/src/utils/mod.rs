//! Utility types for time handling.
//!
//! Wall-clock timestamps stamp jobs and outcomes; monotonic clocks measure
//! elapsed time and can be swapped out in tests.

mod clock;
mod timestamps;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timestamps::{format_iso8601, now_utc, Timestamp};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_format() {
        let ts = format_iso8601(&now_utc());
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
    }
}
