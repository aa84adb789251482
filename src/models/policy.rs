use chrono::Weekday;

use crate::entities::settings;
use crate::models::CutoffMode;

/// Snapshot of the singleton settings record, passed explicitly into every
/// policy decision. No component reads global state.
#[derive(Debug, Clone)]
pub struct OrderPolicy {
    pub cutoff_mode: CutoffMode,
    pub cutoff_days: i64,
    pub cutoff_hours: i64,
    pub weekly_cutoff_weekday: Weekday,
    pub weekly_cutoff_hour: u32,
    pub weekly_cutoff_minute: u32,
    pub orderable_weekdays: Vec<Weekday>,
    pub max_weeks_ahead: i64,
    pub max_order_days_ahead: i64,
    pub blacklist_strikes: i32,
    pub blacklist_duration_days: i64,
}

/// ISO weekday number (1=Monday … 7=Sunday) to chrono `Weekday`.
/// Out-of-range values fall back to Monday; the settings service validates
/// writes so this only guards against hand-edited rows.
pub fn weekday_from_iso(n: i16) -> Weekday {
    match n {
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => Weekday::Mon,
    }
}

/// Parse a comma-separated ISO weekday list ("1,2,3,4,5"). Unparseable or
/// out-of-range entries are skipped.
pub fn parse_weekday_set(s: &str) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = s
        .split(',')
        .filter_map(|part| part.trim().parse::<i16>().ok())
        .filter(|n| (1..=7).contains(n))
        .map(weekday_from_iso)
        .collect();
    days.dedup();
    days
}

impl OrderPolicy {
    pub fn from_settings(m: &settings::Model) -> Self {
        Self {
            cutoff_mode: m.cutoff_mode,
            cutoff_days: m.cutoff_days as i64,
            cutoff_hours: m.cutoff_hours as i64,
            weekly_cutoff_weekday: weekday_from_iso(m.weekly_cutoff_weekday),
            weekly_cutoff_hour: m.weekly_cutoff_hour.clamp(0, 23) as u32,
            weekly_cutoff_minute: m.weekly_cutoff_minute.clamp(0, 59) as u32,
            orderable_weekdays: parse_weekday_set(&m.orderable_weekdays),
            max_weeks_ahead: m.max_weeks_ahead as i64,
            max_order_days_ahead: m.max_order_days_ahead as i64,
            blacklist_strikes: m.blacklist_strikes,
            blacklist_duration_days: m.blacklist_duration_days as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weekday_sets() {
        assert_eq!(
            parse_weekday_set("1,2,3,4,5"),
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri
            ]
        );
        assert_eq!(parse_weekday_set("6, 7"), vec![Weekday::Sat, Weekday::Sun]);
        assert_eq!(parse_weekday_set(""), Vec::<Weekday>::new());
        // 非法项被跳过
        assert_eq!(parse_weekday_set("1,x,8,0"), vec![Weekday::Mon]);
    }

    #[test]
    fn iso_weekday_mapping() {
        assert_eq!(weekday_from_iso(1), Weekday::Mon);
        assert_eq!(weekday_from_iso(5), Weekday::Fri);
        assert_eq!(weekday_from_iso(7), Weekday::Sun);
        assert_eq!(weekday_from_iso(99), Weekday::Mon);
    }
}
