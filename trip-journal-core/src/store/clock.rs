//! Time source for store-managed timestamps.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of `createdAt` / `updatedAt` values.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock that never hands out the same microsecond twice.
///
/// Two writes issued back to back still get strictly increasing timestamps.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_micros: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut last = self.last_micros.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self.last_micros.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return from_micros(next).unwrap_or_else(Utc::now),
                Err(current) => last = current,
            }
        }
    }
}

fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

/// Persisted timestamp format: RFC 3339, microseconds, `Z` suffix.
///
/// Fixed width so that string order equals time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_strictly_monotonic() {
        let clock = SystemClock::new();
        let mut previous = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_timestamp_format_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        let formatted = format_timestamp(&ts);
        assert_eq!(formatted, "2025-06-01T08:30:00.000000Z");
        assert_eq!(parse_timestamp(&formatted), Some(ts));
    }

    #[test]
    fn test_formatted_timestamps_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert!(format_timestamp(&early) < format_timestamp(&late));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
