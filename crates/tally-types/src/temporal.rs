use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Commit timestamp recorded by the ledger for one key modification.
///
/// Stored as whole seconds since the UNIX epoch plus a sub-second
/// nanosecond component (`nanos < 1_000_000_000`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl LedgerTimestamp {
    /// Create a timestamp, carrying excess nanoseconds into `seconds`.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self {
            seconds: seconds.saturating_add(i64::from(nanos / NANOS_PER_SEC)),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Timestamp for the current wall-clock time.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            seconds: elapsed.as_secs() as i64,
            nanos: elapsed.subsec_nanos(),
        }
    }

    /// UTC date-time, or `None` if outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// Renders as `2006-01-02 15:04:05.999999999 +0000 UTC`: trailing zeros of
/// the fraction are trimmed and the fraction is omitted when zero.
impl fmt::Display for LedgerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(datetime) = self.to_datetime() else {
            return write!(f, "{}s+{}ns", self.seconds, self.nanos);
        };
        write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S"))?;
        if self.nanos != 0 {
            let fraction = format!("{:09}", self.nanos);
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        f.write_str(" +0000 UTC")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_whole_seconds() {
        let ts = LedgerTimestamp::new(1_500_000_000, 0);
        assert_eq!(ts.to_string(), "2017-07-14 02:40:00 +0000 UTC");
    }

    #[test]
    fn display_trims_fraction() {
        let ts = LedgerTimestamp::new(0, 120_000_000);
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00.12 +0000 UTC");

        let ts = LedgerTimestamp::new(0, 1);
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00.000000001 +0000 UTC");
    }

    #[test]
    fn new_carries_nanos() {
        let ts = LedgerTimestamp::new(10, 2_500_000_000);
        assert_eq!(ts, LedgerTimestamp { seconds: 12, nanos: 500_000_000 });
    }

    #[test]
    fn ordering_seconds_then_nanos() {
        assert!(LedgerTimestamp::new(1, 999) < LedgerTimestamp::new(2, 0));
        assert!(LedgerTimestamp::new(1, 1) < LedgerTimestamp::new(1, 2));
    }

    #[test]
    fn now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(LedgerTimestamp::now().seconds > 1_577_836_800);
    }

    #[test]
    fn out_of_range_falls_back_to_raw() {
        let ts = LedgerTimestamp::new(i64::MAX, 5);
        assert_eq!(ts.to_string(), format!("{}s+5ns", i64::MAX));
    }

    #[test]
    fn serde_roundtrip() {
        let ts = LedgerTimestamp::new(1_234_567_890, 42);
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: LedgerTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}
