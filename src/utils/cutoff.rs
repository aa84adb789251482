use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime};

use crate::error::OrderRejection;
use crate::models::{CutoffMode, OrderPolicy};
use crate::utils::local_date::at_local;

/// Cutoff decisions for one policy snapshot. Pure: every input, including
/// "now", comes in as a parameter.
pub struct CutoffPolicy<'a> {
    policy: &'a OrderPolicy,
}

/// Start of the ISO week (Monday) containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

impl<'a> CutoffPolicy<'a> {
    pub fn new(policy: &'a OrderPolicy) -> Self {
        Self { policy }
    }

    /// The latest instant at which an order for (date, shift) may still be
    /// created or cancelled.
    ///
    /// Per-shift mode: shift start minus the configured days + hours lead.
    /// Weekly mode: the most recent configured weekday/time boundary strictly
    /// before the start of the date's week; the shift start is irrelevant.
    pub fn cutoff_instant(
        &self,
        date: NaiveDate,
        shift_start: NaiveTime,
        offset: FixedOffset,
    ) -> DateTime<FixedOffset> {
        match self.policy.cutoff_mode {
            CutoffMode::PerShift => {
                at_local(date, shift_start, offset)
                    - Duration::days(self.policy.cutoff_days)
                    - Duration::hours(self.policy.cutoff_hours)
            }
            CutoffMode::Weekly => {
                let mut boundary_date = week_start(date) - Duration::days(1);
                while boundary_date.weekday() != self.policy.weekly_cutoff_weekday {
                    boundary_date -= Duration::days(1);
                }
                let boundary_time = NaiveTime::from_hms_opt(
                    self.policy.weekly_cutoff_hour,
                    self.policy.weekly_cutoff_minute,
                    0,
                )
                .unwrap_or(NaiveTime::MIN);
                at_local(boundary_date, boundary_time, offset)
            }
        }
    }

    /// Check that `date` is inside the orderable window, independent of the
    /// time of day: days-ahead bound in per-shift mode, weekday set and
    /// weeks-ahead bound in weekly mode.
    pub fn check_window(&self, date: NaiveDate, today: NaiveDate) -> Result<(), OrderRejection> {
        match self.policy.cutoff_mode {
            CutoffMode::PerShift => {
                let horizon = today + Duration::days(self.policy.max_order_days_ahead);
                if date > horizon {
                    return Err(OrderRejection::WindowExceeded(format!(
                        "Date {date} is beyond the {} day ordering window (last orderable day {horizon})",
                        self.policy.max_order_days_ahead
                    )));
                }
            }
            CutoffMode::Weekly => {
                if !self.policy.orderable_weekdays.contains(&date.weekday()) {
                    return Err(OrderRejection::WindowExceeded(format!(
                        "Weekday of {date} is not orderable"
                    )));
                }
                let horizon = week_start(today) + Duration::weeks(self.policy.max_weeks_ahead);
                if week_start(date) > horizon {
                    return Err(OrderRejection::WindowExceeded(format!(
                        "Date {date} is more than {} weeks ahead",
                        self.policy.max_weeks_ahead
                    )));
                }
            }
        }
        Ok(())
    }

    /// Strict cutoff check: ordering requires `now < cutoff`; an instant
    /// exactly equal to the cutoff is already past it.
    pub fn check_cutoff(
        &self,
        date: NaiveDate,
        shift_start: NaiveTime,
        now: DateTime<FixedOffset>,
    ) -> Result<(), OrderRejection> {
        let cutoff = self.cutoff_instant(date, shift_start, *now.offset());
        if now >= cutoff {
            return Err(OrderRejection::CutoffPassed { date, cutoff });
        }
        Ok(())
    }

    /// Cancellation uses the same cutoff instant as ordering, surfaced as its
    /// own kind.
    pub fn check_cancel_cutoff(
        &self,
        date: NaiveDate,
        shift_start: NaiveTime,
        now: DateTime<FixedOffset>,
    ) -> Result<(), OrderRejection> {
        let cutoff = self.cutoff_instant(date, shift_start, *now.offset());
        if now >= cutoff {
            return Err(OrderRejection::CancelCutoffPassed { date, cutoff });
        }
        Ok(())
    }

    /// Combined convenience used by availability listings.
    pub fn can_order(
        &self,
        date: NaiveDate,
        shift_start: NaiveTime,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> bool {
        date >= today
            && self.check_window(date, today).is_ok()
            && self.check_cutoff(date, shift_start, now).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn cst() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(y: i32, mo: u32, day: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        at_local(d(y, mo, day), t(h, mi), cst())
    }

    fn per_shift_policy(cutoff_days: i64, cutoff_hours: i64) -> OrderPolicy {
        OrderPolicy {
            cutoff_mode: CutoffMode::PerShift,
            cutoff_days,
            cutoff_hours,
            weekly_cutoff_weekday: Weekday::Fri,
            weekly_cutoff_hour: 17,
            weekly_cutoff_minute: 0,
            orderable_weekdays: vec![],
            max_weeks_ahead: 2,
            max_order_days_ahead: 14,
            blacklist_strikes: 3,
            blacklist_duration_days: 30,
        }
    }

    fn weekly_policy() -> OrderPolicy {
        OrderPolicy {
            cutoff_mode: CutoffMode::Weekly,
            cutoff_days: 0,
            cutoff_hours: 0,
            weekly_cutoff_weekday: Weekday::Fri,
            weekly_cutoff_hour: 17,
            weekly_cutoff_minute: 0,
            orderable_weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            max_weeks_ahead: 2,
            max_order_days_ahead: 14,
            blacklist_strikes: 3,
            blacklist_duration_days: 30,
        }
    }

    #[test]
    fn per_shift_cutoff_six_hours_before_start() {
        // 08:00 开始的班次，提前 6 小时截单 → 当天 02:00
        let policy = per_shift_policy(0, 6);
        let cutoff = CutoffPolicy::new(&policy);
        assert_eq!(
            cutoff.cutoff_instant(d(2025, 1, 10), t(8, 0), cst()),
            at(2025, 1, 10, 2, 0)
        );

        // Scenario A: now 09:00 当天 → 已过截单
        let err = cutoff
            .check_cutoff(d(2025, 1, 10), t(8, 0), at(2025, 1, 10, 9, 0))
            .unwrap_err();
        assert!(matches!(err, OrderRejection::CutoffPassed { .. }));

        // Scenario B: 前一天 20:00 → 允许
        assert!(cutoff
            .check_cutoff(d(2025, 1, 10), t(8, 0), at(2025, 1, 9, 20, 0))
            .is_ok());
    }

    #[test]
    fn instant_equal_to_cutoff_is_already_past() {
        let policy = per_shift_policy(0, 6);
        let cutoff = CutoffPolicy::new(&policy);
        let boundary = at(2025, 1, 10, 2, 0);
        assert!(cutoff
            .check_cutoff(d(2025, 1, 10), t(8, 0), boundary)
            .is_err());
        assert!(cutoff
            .check_cutoff(d(2025, 1, 10), t(8, 0), boundary - Duration::seconds(1))
            .is_ok());
    }

    #[test]
    fn can_order_is_monotonic_in_time() {
        let policy = per_shift_policy(1, 2);
        let cutoff = CutoffPolicy::new(&policy);
        let date = d(2025, 1, 10);
        let boundary = cutoff.cutoff_instant(date, t(8, 0), cst());
        let today = d(2025, 1, 7);

        let mut seen_closed = false;
        let mut now = boundary - Duration::hours(3);
        while now <= boundary + Duration::hours(3) {
            let open = cutoff.can_order(date, t(8, 0), today, now);
            assert_eq!(open, now < boundary);
            if !open {
                seen_closed = true;
            } else {
                // 一旦关闭就不会再打开
                assert!(!seen_closed);
            }
            now += Duration::minutes(30);
        }
        assert!(seen_closed);
    }

    #[test]
    fn per_shift_window_bound() {
        let policy = per_shift_policy(0, 6);
        let cutoff = CutoffPolicy::new(&policy);
        let today = d(2025, 1, 10);
        assert!(cutoff.check_window(d(2025, 1, 24), today).is_ok());
        let err = cutoff.check_window(d(2025, 1, 25), today).unwrap_err();
        assert!(matches!(err, OrderRejection::WindowExceeded(_)));
    }

    #[test]
    fn weekly_boundary_precedes_target_week() {
        // 2025-01-14 是周二，所在周从周一 01-13 开始；
        // 最近一个在其之前的周五 17:00 是 01-10 17:00
        let policy = weekly_policy();
        let cutoff = CutoffPolicy::new(&policy);
        assert_eq!(
            cutoff.cutoff_instant(d(2025, 1, 14), t(8, 0), cst()),
            at(2025, 1, 10, 17, 0)
        );
        // 同一周内的每个目标日共享同一个边界
        assert_eq!(
            cutoff.cutoff_instant(d(2025, 1, 17), t(12, 0), cst()),
            at(2025, 1, 10, 17, 0)
        );
    }

    #[test]
    fn weekly_cutoff_closes_at_boundary() {
        let policy = weekly_policy();
        let cutoff = CutoffPolicy::new(&policy);
        let target = d(2025, 1, 14);
        assert!(cutoff
            .check_cutoff(target, t(8, 0), at(2025, 1, 10, 16, 59))
            .is_ok());
        assert!(cutoff
            .check_cutoff(target, t(8, 0), at(2025, 1, 10, 17, 0))
            .is_err());
        assert!(cutoff
            .check_cutoff(target, t(8, 0), at(2025, 1, 12, 9, 0))
            .is_err());
    }

    #[test]
    fn weekly_rejects_non_orderable_weekday() {
        let policy = weekly_policy();
        let cutoff = CutoffPolicy::new(&policy);
        // 2025-01-18 是周六
        let err = cutoff.check_window(d(2025, 1, 18), d(2025, 1, 8)).unwrap_err();
        assert!(matches!(err, OrderRejection::WindowExceeded(_)));
    }

    #[test]
    fn weekly_weeks_ahead_bound() {
        let policy = weekly_policy();
        let cutoff = CutoffPolicy::new(&policy);
        let today = d(2025, 1, 8); // 周三，所在周从 01-06 开始
        // 两周以内：01-20 那一周可订
        assert!(cutoff.check_window(d(2025, 1, 22), today).is_ok());
        // 01-27 开始的那一周超出 max_weeks_ahead=2
        let err = cutoff.check_window(d(2025, 1, 28), today).unwrap_err();
        assert!(matches!(err, OrderRejection::WindowExceeded(_)));
    }

    #[test]
    fn cancel_uses_same_instant_with_distinct_kind() {
        let policy = per_shift_policy(0, 6);
        let cutoff = CutoffPolicy::new(&policy);
        let err = cutoff
            .check_cancel_cutoff(d(2025, 1, 10), t(8, 0), at(2025, 1, 10, 2, 0))
            .unwrap_err();
        match err {
            OrderRejection::CancelCutoffPassed { cutoff: instant, .. } => {
                assert_eq!(instant, at(2025, 1, 10, 2, 0));
            }
            other => panic!("unexpected rejection: {other:?}"),
        }
    }
}
