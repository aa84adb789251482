use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "holidays")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    /// 为空表示全天所有班次停餐，否则只停指定班次
    pub shift_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this holiday blocks ordering for the given shift.
    pub fn blocks_shift(&self, shift_id: i64) -> bool {
        match self.shift_id {
            None => true,
            Some(id) => id == shift_id,
        }
    }
}
