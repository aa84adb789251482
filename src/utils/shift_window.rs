use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Timelike};

use crate::utils::local_date::at_local;

/// Absolute instants of one shift on one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub break_window: Option<BreakWindow>,
}

/// Narrower pickup window inside a shift.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// A shift is overnight iff its end time is numerically not after its start
/// time, meaning it ends on the following calendar day. Derived every time,
/// never stored.
pub fn is_overnight(start: NaiveTime, end: NaiveTime) -> bool {
    end.hour() < start.hour() || (end.hour() == start.hour() && end.minute() <= start.minute())
}

/// Compute the absolute shift window anchored to `date`.
///
/// The end instant advances one day for overnight shifts. Break instants are
/// resolved relative to the shift window, not independently: a break start
/// numerically before the shift start belongs to the next day, and a break
/// end not after the break start rolls over as well. An overnight shift
/// (22:00–06:00) can therefore host a break crossing midnight (00:30–01:30)
/// without any date bookkeeping by the caller.
pub fn resolve(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    break_times: Option<(NaiveTime, NaiveTime)>,
    offset: FixedOffset,
) -> ShiftWindow {
    let start_instant = at_local(date, start, offset);
    let mut end_instant = at_local(date, end, offset);
    if is_overnight(start, end) {
        end_instant += Duration::days(1);
    }

    let break_window = break_times.map(|(break_start, break_end)| {
        let mut bs = at_local(date, break_start, offset);
        if bs < start_instant {
            bs += Duration::days(1);
        }
        let mut be = at_local(date, break_end, offset);
        if be <= bs {
            be += Duration::days(1);
        }
        BreakWindow { start: bs, end: be }
    });

    ShiftWindow {
        start: start_instant,
        end: end_instant,
        break_window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cst() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn overnight_iff_end_not_after_start() {
        // 字典序 end <= start 即跨夜，否则不是
        let samples = [
            (t(8, 0), t(16, 0), false),
            (t(22, 0), t(6, 0), true),
            (t(0, 0), t(23, 59), false),
            (t(12, 0), t(12, 0), true), // equal counts as overnight
            (t(12, 30), t(12, 0), true),
            (t(12, 0), t(12, 30), false),
            (t(23, 0), t(0, 0), true),
        ];
        for (start, end, expected) in samples {
            assert_eq!(is_overnight(start, end), expected, "{start}-{end}");
        }
    }

    #[test]
    fn day_shift_stays_on_anchor_date() {
        let w = resolve(d(2025, 1, 10), t(8, 0), t(16, 0), None, cst());
        assert_eq!(w.start.to_rfc3339(), "2025-01-10T08:00:00+08:00");
        assert_eq!(w.end.to_rfc3339(), "2025-01-10T16:00:00+08:00");
        assert!(w.break_window.is_none());
    }

    #[test]
    fn overnight_shift_ends_next_day() {
        let w = resolve(d(2025, 1, 10), t(22, 0), t(6, 0), None, cst());
        assert_eq!(w.start.to_rfc3339(), "2025-01-10T22:00:00+08:00");
        assert_eq!(w.end.to_rfc3339(), "2025-01-11T06:00:00+08:00");
    }

    #[test]
    fn overnight_duration_is_always_positive() {
        let times = [
            (t(22, 0), t(6, 0)),
            (t(23, 30), t(0, 15)),
            (t(12, 0), t(12, 0)),
            (t(18, 45), t(2, 30)),
            (t(0, 1), t(0, 0)),
        ];
        for (start, end) in times {
            assert!(is_overnight(start, end));
            let w = resolve(d(2025, 6, 1), start, end, None, cst());
            assert!(w.end > w.start, "{start}-{end}");
        }
    }

    #[test]
    fn break_after_midnight_in_overnight_shift() {
        // 22:00–06:00 的班次，00:30–01:30 的休息窗落在次日
        let w = resolve(
            d(2025, 1, 10),
            t(22, 0),
            t(6, 0),
            Some((t(0, 30), t(1, 30))),
            cst(),
        );
        let bw = w.break_window.unwrap();
        assert_eq!(bw.start.to_rfc3339(), "2025-01-11T00:30:00+08:00");
        assert_eq!(bw.end.to_rfc3339(), "2025-01-11T01:30:00+08:00");
    }

    #[test]
    fn break_crossing_midnight_itself() {
        let w = resolve(
            d(2025, 1, 10),
            t(22, 0),
            t(6, 0),
            Some((t(23, 30), t(0, 30))),
            cst(),
        );
        let bw = w.break_window.unwrap();
        assert_eq!(bw.start.to_rfc3339(), "2025-01-10T23:30:00+08:00");
        assert_eq!(bw.end.to_rfc3339(), "2025-01-11T00:30:00+08:00");
    }

    #[test]
    fn break_inside_plain_day_shift() {
        let w = resolve(
            d(2025, 1, 10),
            t(8, 0),
            t(16, 0),
            Some((t(11, 30), t(12, 30))),
            cst(),
        );
        let bw = w.break_window.unwrap();
        assert_eq!(bw.start.to_rfc3339(), "2025-01-10T11:30:00+08:00");
        assert_eq!(bw.end.to_rfc3339(), "2025-01-10T12:30:00+08:00");
    }
}
