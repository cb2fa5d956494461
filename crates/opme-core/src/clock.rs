//! # Clock
//!
//! Where "today" comes from for the date rules.
//!
//! Validators take `today: NaiveDate` as an argument; only the record layer
//! holds a [`Clock`]. A clock is read on every call and never cached, so the
//! same birth date may pass today and fail tomorrow if the clock moved past
//! the boundary it encodes.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

/// UTC offset of Brasília time, in minutes.
pub const BRASILIA_UTC_OFFSET_MINUTES: i32 = -180;

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock at a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        SystemClock { offset }
    }

    /// Returns `None` when the offset is outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(SystemClock::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    /// Brasília time (UTC-3).
    fn default() -> Self {
        SystemClock::from_offset_minutes(BRASILIA_UTC_OFFSET_MINUTES)
            .unwrap_or_else(|| SystemClock::new(Utc.fix()))
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// A clock stuck on one date, for tests and replaying historical imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }

    #[test]
    fn test_system_clock_offsets() {
        let clock = SystemClock::default();
        assert_eq!(clock.offset().local_minus_utc(), -3 * 3600);

        assert!(SystemClock::from_offset_minutes(14 * 60).is_some());
        assert!(SystemClock::from_offset_minutes(25 * 60).is_none());
        assert!(SystemClock::from_offset_minutes(i32::MAX).is_none());
    }

    #[test]
    fn test_system_clock_is_within_a_day_of_utc() {
        let utc_today = Utc::now().date_naive();
        let local = SystemClock::default().today();
        assert!((local - utc_today).num_days().abs() <= 1);
    }
}
