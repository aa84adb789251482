use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

/// Parse a `YYYY-MM-DD` string by decomposing the literal calendar components.
/// Deliberately avoids any timestamp-based constructor so a "local day" can
/// never shift by one across time zones.
pub fn parse_local_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a wall-clock `HH:mm` string into a `NaiveTime`.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Absolute instant of a wall-clock time on a calendar date in the fixed
/// local zone.
pub fn at_local(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    DateTime::from_naive_utc_and_offset(date.and_time(time) - offset, offset)
}

/// Local midnight of a calendar date.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    at_local(date, NaiveTime::MIN, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cst() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_local_date("2025-01-10"),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        assert_eq!(
            parse_local_date("2025-2-3"),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_local_date("2025-13-01"), None);
        assert_eq!(parse_local_date("2025-02-30"), None);
        assert_eq!(parse_local_date("not-a-date"), None);
        assert_eq!(parse_local_date("2025/01/10"), None);
        assert_eq!(parse_local_date(""), None);
        // 时间戳形式必须拒绝，只接受纯日期
        assert_eq!(parse_local_date("2025-01-10T00:00:00Z"), None);
    }

    #[test]
    fn parses_hhmm() {
        assert_eq!(parse_hhmm("08:00"), NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(parse_hhmm("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("8:00"), None);
        assert_eq!(parse_hhmm("08:60"), None);
        assert_eq!(parse_hhmm("0800"), None);
    }

    #[test]
    fn at_local_preserves_wall_clock() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let instant = at_local(date, time, cst());
        assert_eq!(instant.to_rfc3339(), "2025-01-10T08:00:00+08:00");
        // 对应的 UTC 时刻在前一天晚上
        assert_eq!(instant.naive_utc().to_string(), "2025-01-10 00:00:00");
    }

    #[test]
    fn local_midnight_is_start_of_day() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let midnight = local_midnight(date, cst());
        assert_eq!(midnight.to_rfc3339(), "2025-01-10T00:00:00+08:00");
    }
}
