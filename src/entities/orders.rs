use crate::models::OrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub shift_id: i64,
    pub canteen_id: Option<i64>,
    pub order_date: NaiveDate,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub qr_token: String,
    pub check_in_at: Option<DateTime<Utc>>,
    pub checked_in_by: Option<i64>,
    pub cancelled_by: Option<i64>,
    pub cancel_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
