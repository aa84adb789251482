use crate::models::CutoffMode;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Singleton operating configuration; exactly one row exists.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub cutoff_mode: CutoffMode,
    pub cutoff_days: i32,
    pub cutoff_hours: i32,
    /// ISO 星期（1=周一 … 7=周日）
    pub weekly_cutoff_weekday: i16,
    pub weekly_cutoff_hour: i16,
    pub weekly_cutoff_minute: i16,
    /// 逗号分隔的 ISO 星期列表
    pub orderable_weekdays: String,
    pub max_weeks_ahead: i32,
    pub max_order_days_ahead: i32,
    pub blacklist_strikes: i32,
    pub blacklist_duration_days: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
