use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// 班次起止为墙钟时间；end <= start 表示跨夜班，跨夜属性每次推导，不落库
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start_time: Option<NaiveTime>,
    pub break_end_time: Option<NaiveTime>,
    pub is_active: bool,
    pub meal_price: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn break_times(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.break_start_time, self.break_end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}
