//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Negative if `other` is after `self`.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Adds whole days. Negative values subtract.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    pub fn minus_hours(&self, hours: i64) -> Self {
        Self(self.0 - Duration::hours(hours))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn now_is_between_surrounding_instants() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn add_days_crosses_month_boundary() {
        let ts = fixed(2024, 1, 25).add_days(14);
        assert_eq!(ts, fixed(2024, 2, 8));
    }

    #[test]
    fn minus_hours_moves_backwards() {
        let ts = fixed(2024, 3, 2);
        assert_eq!(ts.minus_hours(24), fixed(2024, 3, 1));
    }

    #[test]
    fn ordering_helpers_agree_with_ord() {
        let early = fixed(2024, 1, 1);
        let late = fixed(2024, 1, 2);
        assert!(early.is_before(&late));
        assert!(late.is_after(&early));
        assert!(early < late);
        assert_eq!(late.duration_since(&early), Duration::days(1));
    }

    #[test]
    fn serializes_transparently() {
        let ts = fixed(2024, 5, 6);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-05-06T12:00:00Z\"");
    }
}
