use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

/// Authoritative time source. Every component that reasons about "now" or
/// "today" goes through this trait instead of the raw system clock, so the
/// whole order lifecycle can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    /// Current instant in the configured local time zone.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Local calendar date of `now()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock: system time shifted into a fixed local offset, plus a
/// static correction in milliseconds (stand-in for an NTP-derived adjustment).
pub struct SystemClock {
    offset: FixedOffset,
    correction: Duration,
}

impl SystemClock {
    pub fn new(utc_offset_hours: i32, correction_ms: i64) -> Self {
        // 偏移范围已在配置加载时校验过
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        Self {
            offset,
            correction: Duration::milliseconds(correction_ms),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        (Utc::now() + self.correction).with_timezone(&self.offset)
    }
}

/// Clock pinned to one instant, for tests and replay.
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_pinned_instant() {
        let instant = DateTime::parse_from_rfc3339("2025-01-10T09:00:00+08:00").unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }

    #[test]
    fn today_follows_local_offset_not_utc() {
        // 本地 00:30 对应的 UTC 日期还是前一天
        let instant = DateTime::parse_from_rfc3339("2025-01-10T00:30:00+08:00").unwrap();
        let clock = FixedClock(instant);
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert_eq!(
            instant.naive_utc().date(),
            NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
        );
    }

    #[test]
    fn system_clock_applies_offset() {
        let clock = SystemClock::new(8, 0);
        let now = clock.now();
        assert_eq!(now.offset().local_minus_utc(), 8 * 3600);
    }
}
