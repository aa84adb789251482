//! Pure validation rules for the order lifecycle.
//!
//! Every check reads only from the passed-in context and lookup structures,
//! so the same pipeline serves the single-order path (lookups built from
//! point queries) and the bulk planner (lookups built from the batch
//! pre-fetch) without touching storage itself.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};

use crate::entities::{blacklists, holidays, shifts};
use crate::error::OrderRejection;
use crate::models::OrderPolicy;
use crate::utils::cutoff::CutoffPolicy;
use crate::utils::local_date::parse_local_date;
use crate::utils::shift_window::ShiftWindow;

/// Fixed early-arrival grace before shift start when no break window is
/// configured. No grace on the late side.
pub const CHECKIN_EARLY_GRACE_MINUTES: i64 = 30;

pub struct OrderRuleContext<'a> {
    pub policy: &'a OrderPolicy,
    pub today: NaiveDate,
    pub now: DateTime<FixedOffset>,
}

/// In-memory lookups the pipeline validates against.
pub struct OrderLookups<'a> {
    /// Dates of the user's existing non-cancelled orders.
    pub existing_dates: &'a HashSet<NaiveDate>,
    pub holidays: &'a [holidays::Model],
    pub shifts: &'a HashMap<i64, shifts::Model>,
}

/// Run the create-order checks for one (date, shift) candidate, in their
/// fixed order; the first failure short-circuits. Returns the parsed date on
/// success.
pub fn validate_candidate(
    ctx: &OrderRuleContext,
    lookups: &OrderLookups,
    raw_date: &str,
    shift_id: i64,
) -> Result<NaiveDate, OrderRejection> {
    // 1. 日期解析：手动分解年月日，绝不经过 UTC 构造器
    let date =
        parse_local_date(raw_date).ok_or_else(|| OrderRejection::InvalidDate(raw_date.into()))?;

    // 2. 过去的日期直接拒绝
    if date < ctx.today {
        return Err(OrderRejection::PastDate(date));
    }

    // 3. 可订窗口（按模式：天数上限 / 可订星期 + 周数上限）
    let cutoff = CutoffPolicy::new(ctx.policy);
    cutoff.check_window(date, ctx.today)?;

    // 4. 同一用户同一天至多一个有效订单
    if lookups.existing_dates.contains(&date) {
        return Err(OrderRejection::DuplicateOrder(date));
    }

    // 5. 节假日：全天停餐或只停本班次
    if let Some(holiday) = lookups
        .holidays
        .iter()
        .find(|h| h.date == date && h.blocks_shift(shift_id))
    {
        return Err(OrderRejection::HolidayBlocked {
            date,
            name: holiday.name.clone(),
        });
    }

    // 6. 班次存在且启用
    let shift = lookups
        .shifts
        .get(&shift_id)
        .ok_or(OrderRejection::ShiftNotFound(shift_id))?;
    if !shift.is_active {
        return Err(OrderRejection::ShiftInactive(shift.name.clone()));
    }

    // 7. 截单时间：now < cutoff 才放行
    cutoff.check_cutoff(date, shift.start_time, ctx.now)?;

    Ok(date)
}

/// An effectively active blacklist row suspends ordering entirely.
pub fn check_not_blacklisted(active: Option<&blacklists::Model>) -> Result<(), OrderRejection> {
    if let Some(entry) = active {
        let until = match entry.end_date {
            Some(end) => format!("until {}", end.format("%Y-%m-%d %H:%M UTC")),
            None => "indefinitely".to_string(),
        };
        return Err(OrderRejection::UserBlacklisted(until));
    }
    Ok(())
}

/// No-show rule: an order only fails once its shift is strictly over. At the
/// exact end instant the shift still counts as running.
pub fn shift_has_ended(window: &ShiftWindow, now: DateTime<FixedOffset>) -> bool {
    now > window.end
}

/// Check-in time rule: inside the break window when one is configured
/// (strict, no grace), otherwise `[shift start − 30 min, shift end]`.
pub fn check_pickup_window(
    window: &ShiftWindow,
    now: DateTime<FixedOffset>,
) -> Result<(), OrderRejection> {
    let (open, close) = match &window.break_window {
        Some(bw) => (bw.start, bw.end),
        None => (
            window.start - Duration::minutes(CHECKIN_EARLY_GRACE_MINUTES),
            window.end,
        ),
    };
    if now < open {
        return Err(OrderRejection::CheckinTooEarly(open));
    }
    if now > close {
        return Err(OrderRejection::CheckinTooLate(close));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CutoffMode, OrderPolicy};
    use crate::utils::local_date::at_local;
    use crate::utils::shift_window;
    use chrono::{NaiveTime, Weekday};

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

    fn policy() -> OrderPolicy {
        OrderPolicy {
            cutoff_mode: CutoffMode::PerShift,
            cutoff_days: 0,
            cutoff_hours: 6,
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

    fn shift(id: i64, start: NaiveTime, end: NaiveTime, is_active: bool) -> shifts::Model {
        shifts::Model {
            id,
            name: format!("shift-{id}"),
            start_time: start,
            end_time: end,
            break_start_time: None,
            break_end_time: None,
            is_active,
            meal_price: 1500,
            created_at: None,
            updated_at: None,
        }
    }

    fn holiday(date: NaiveDate, shift_id: Option<i64>) -> holidays::Model {
        holidays::Model {
            id: 1,
            name: "节假日".into(),
            date,
            shift_id,
            created_at: None,
        }
    }

    struct Fixture {
        existing: HashSet<NaiveDate>,
        holidays: Vec<holidays::Model>,
        shifts: HashMap<i64, shifts::Model>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut shifts = HashMap::new();
            shifts.insert(1, shift(1, t(8, 0), t(16, 0), true));
            shifts.insert(2, shift(2, t(22, 0), t(6, 0), true));
            shifts.insert(3, shift(3, t(8, 0), t(16, 0), false));
            Self {
                existing: HashSet::new(),
                holidays: vec![],
                shifts,
            }
        }

        fn lookups(&self) -> OrderLookups<'_> {
            OrderLookups {
                existing_dates: &self.existing,
                holidays: &self.holidays,
                shifts: &self.shifts,
            }
        }
    }

    fn ctx(policy: &OrderPolicy, now: DateTime<FixedOffset>) -> OrderRuleContext<'_> {
        OrderRuleContext {
            policy,
            today: now.date_naive(),
            now,
        }
    }

    #[test]
    fn accepts_valid_candidate() {
        let p = policy();
        let fixture = Fixture::new();
        let ctx = ctx(&p, at(2025, 1, 9, 20, 0));
        let date = validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 1).unwrap();
        assert_eq!(date, d(2025, 1, 10));
    }

    #[test]
    fn checks_fail_in_pipeline_order() {
        let p = policy();
        let mut fixture = Fixture::new();
        fixture.existing.insert(d(2025, 1, 10));
        fixture.holidays.push(holiday(d(2025, 1, 10), None));
        let ctx = ctx(&p, at(2025, 1, 9, 20, 0));

        // 无效日期最先拦截
        let err = validate_candidate(&ctx, &fixture.lookups(), "nope", 1).unwrap_err();
        assert!(matches!(err, OrderRejection::InvalidDate(_)));

        // 过去日期在重复/节假日之前
        let err = validate_candidate(&ctx, &fixture.lookups(), "2025-01-08", 1).unwrap_err();
        assert!(matches!(err, OrderRejection::PastDate(_)));

        // 窗口越界在重复检查之前
        let err = validate_candidate(&ctx, &fixture.lookups(), "2025-02-10", 1).unwrap_err();
        assert!(matches!(err, OrderRejection::WindowExceeded(_)));

        // 同日重复订单在节假日之前
        let err = validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 1).unwrap_err();
        assert!(matches!(err, OrderRejection::DuplicateOrder(_)));
    }

    #[test]
    fn full_day_holiday_blocks_any_shift() {
        let p = policy();
        let mut fixture = Fixture::new();
        fixture.holidays.push(holiday(d(2025, 1, 10), None));
        let ctx = ctx(&p, at(2025, 1, 9, 10, 0));
        for shift_id in [1, 2] {
            let err = validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", shift_id)
                .unwrap_err();
            assert!(matches!(err, OrderRejection::HolidayBlocked { .. }));
        }
    }

    #[test]
    fn scoped_holiday_blocks_only_its_shift() {
        let p = policy();
        let mut fixture = Fixture::new();
        fixture.holidays.push(holiday(d(2025, 1, 10), Some(1)));
        let ctx = ctx(&p, at(2025, 1, 9, 10, 0));
        let err = validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 1).unwrap_err();
        assert!(matches!(err, OrderRejection::HolidayBlocked { .. }));
        // 班次 2 不受影响
        assert!(validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 2).is_ok());
    }

    #[test]
    fn unknown_and_inactive_shifts() {
        let p = policy();
        let fixture = Fixture::new();
        let ctx = ctx(&p, at(2025, 1, 9, 10, 0));
        let err = validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 99).unwrap_err();
        assert!(matches!(err, OrderRejection::ShiftNotFound(99)));
        let err = validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 3).unwrap_err();
        assert!(matches!(err, OrderRejection::ShiftInactive(_)));
    }

    #[test]
    fn cutoff_is_last_check() {
        // Scenario A: 08:00 班次提前 6 小时截单，当天 09:00 下单已迟
        let p = policy();
        let fixture = Fixture::new();
        let ctx = ctx(&p, at(2025, 1, 10, 9, 0));
        let err = validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 1).unwrap_err();
        match err {
            OrderRejection::CutoffPassed { cutoff, .. } => {
                assert_eq!(cutoff, at(2025, 1, 10, 2, 0));
            }
            other => panic!("unexpected rejection: {other:?}"),
        }
    }

    #[test]
    fn bulk_shape_one_success_two_distinct_failures() {
        // Scenario E：三个候选共享同一组查好的数据，各自得到不同结论
        let p = policy();
        let mut fixture = Fixture::new();
        fixture.existing.insert(d(2025, 1, 10));
        fixture.holidays.push(holiday(d(2025, 1, 11), None));
        let ctx = ctx(&p, at(2025, 1, 9, 10, 0));
        let lookups = fixture.lookups();

        let results: Vec<_> = [("2025-01-10", 1), ("2025-01-11", 1), ("2025-01-13", 1)]
            .iter()
            .map(|(date, shift_id)| validate_candidate(&ctx, &lookups, date, *shift_id))
            .collect();

        assert!(matches!(
            results[0],
            Err(OrderRejection::DuplicateOrder(_))
        ));
        assert!(matches!(
            results[1],
            Err(OrderRejection::HolidayBlocked { .. })
        ));
        assert!(results[2].is_ok());
        let codes: HashSet<&str> = results
            .iter()
            .filter_map(|r| r.as_ref().err().map(|e| e.code()))
            .collect();
        assert_eq!(codes.len(), 2);
    }

    #[test]
    fn cancelled_order_frees_the_date() {
        // 取消后同日可以重新下单：取消的订单不会出现在已有日期集合里
        let p = policy();
        let mut fixture = Fixture::new();
        fixture.existing.insert(d(2025, 1, 10));
        let ctx = ctx(&p, at(2025, 1, 9, 10, 0));
        assert!(matches!(
            validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 1),
            Err(OrderRejection::DuplicateOrder(_))
        ));
        fixture.existing.remove(&d(2025, 1, 10));
        assert!(validate_candidate(&ctx, &fixture.lookups(), "2025-01-10", 1).is_ok());
    }

    #[test]
    fn shift_end_is_exclusive_for_no_show() {
        let window = shift_window::resolve(d(2025, 1, 10), t(8, 0), t(16, 0), None, cst());
        // 恰好在结束时刻班次仍算进行中
        assert!(!shift_has_ended(&window, at(2025, 1, 10, 16, 0)));
        assert!(shift_has_ended(&window, at(2025, 1, 10, 16, 1)));
        // 跨夜班次以次日结束时刻为准
        let overnight = shift_window::resolve(d(2025, 1, 10), t(22, 0), t(6, 0), None, cst());
        assert!(!shift_has_ended(&overnight, at(2025, 1, 11, 6, 0)));
        assert!(shift_has_ended(&overnight, at(2025, 1, 11, 6, 1)));
    }

    #[test]
    fn blacklisted_user_is_rejected() {
        let entry = blacklists::Model {
            id: 1,
            user_id: 5,
            reason: "3 no-shows".into(),
            start_date: at(2025, 1, 1, 0, 0).to_utc(),
            end_date: None,
            is_active: true,
            created_by: None,
            created_at: None,
        };
        let err = check_not_blacklisted(Some(&entry)).unwrap_err();
        assert!(matches!(err, OrderRejection::UserBlacklisted(_)));
        assert!(check_not_blacklisted(None).is_ok());
    }

    #[test]
    fn pickup_window_with_grace() {
        let window = shift_window::resolve(d(2025, 1, 10), t(8, 0), t(16, 0), None, cst());
        // 07:29 太早，07:30 起放行，16:00 截止，16:01 太迟
        let err = check_pickup_window(&window, at(2025, 1, 10, 7, 29)).unwrap_err();
        match err {
            OrderRejection::CheckinTooEarly(open) => assert_eq!(open, at(2025, 1, 10, 7, 30)),
            other => panic!("unexpected rejection: {other:?}"),
        }
        assert!(check_pickup_window(&window, at(2025, 1, 10, 7, 30)).is_ok());
        assert!(check_pickup_window(&window, at(2025, 1, 10, 16, 0)).is_ok());
        let err = check_pickup_window(&window, at(2025, 1, 10, 16, 1)).unwrap_err();
        assert!(matches!(err, OrderRejection::CheckinTooLate(_)));
    }

    #[test]
    fn break_window_is_strict() {
        let window = shift_window::resolve(
            d(2025, 1, 10),
            t(22, 0),
            t(6, 0),
            Some((t(0, 30), t(1, 30))),
            cst(),
        );
        // 休息窗没有提前量
        let err = check_pickup_window(&window, at(2025, 1, 11, 0, 29)).unwrap_err();
        assert!(matches!(err, OrderRejection::CheckinTooEarly(_)));
        assert!(check_pickup_window(&window, at(2025, 1, 11, 0, 30)).is_ok());
        assert!(check_pickup_window(&window, at(2025, 1, 11, 1, 30)).is_ok());
        let err = check_pickup_window(&window, at(2025, 1, 11, 1, 31)).unwrap_err();
        assert!(matches!(err, OrderRejection::CheckinTooLate(_)));
    }
}
