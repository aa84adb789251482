use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Operating mode of the ordering cutoff. Exactly one branch of the settings
/// record is authoritative at a time, selected by this value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum CutoffMode {
    #[sea_orm(string_value = "per_shift")]
    PerShift,
    #[sea_orm(string_value = "weekly")]
    Weekly,
}

impl std::fmt::Display for CutoffMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CutoffMode::PerShift => write!(f, "per_shift"),
            CutoffMode::Weekly => write!(f, "weekly"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingsResponse {
    pub cutoff_mode: CutoffMode,
    pub cutoff_days: i32,
    pub cutoff_hours: i32,
    pub weekly_cutoff_weekday: i16,
    pub weekly_cutoff_hour: i16,
    pub weekly_cutoff_minute: i16,
    pub orderable_weekdays: String,
    pub max_weeks_ahead: i32,
    pub max_order_days_ahead: i32,
    pub blacklist_strikes: i32,
    pub blacklist_duration_days: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub cutoff_mode: Option<CutoffMode>,
    pub cutoff_days: Option<i32>,
    pub cutoff_hours: Option<i32>,
    /// ISO 星期（1=周一 … 7=周日）
    pub weekly_cutoff_weekday: Option<i16>,
    pub weekly_cutoff_hour: Option<i16>,
    pub weekly_cutoff_minute: Option<i16>,
    /// 逗号分隔的 ISO 星期列表，如 "1,2,3,4,5"
    pub orderable_weekdays: Option<String>,
    pub max_weeks_ahead: Option<i32>,
    pub max_order_days_ahead: Option<i32>,
    pub blacklist_strikes: Option<i32>,
    pub blacklist_duration_days: Option<i32>,
}

impl From<crate::entities::settings::Model> for SettingsResponse {
    fn from(m: crate::entities::settings::Model) -> Self {
        Self {
            cutoff_mode: m.cutoff_mode,
            cutoff_days: m.cutoff_days,
            cutoff_hours: m.cutoff_hours,
            weekly_cutoff_weekday: m.weekly_cutoff_weekday,
            weekly_cutoff_hour: m.weekly_cutoff_hour,
            weekly_cutoff_minute: m.weekly_cutoff_minute,
            orderable_weekdays: m.orderable_weekdays,
            max_weeks_ahead: m.max_weeks_ahead,
            max_order_days_ahead: m.max_order_days_ahead,
            blacklist_strikes: m.blacklist_strikes,
            blacklist_duration_days: m.blacklist_duration_days,
        }
    }
}
