use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Order lifecycle state. ORDERED is the only non-terminal state; every
/// transition out of it is final.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "ordered")]
    Ordered,
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    #[sea_orm(string_value = "no_show")]
    NoShow,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Ordered => write!(f, "ordered"),
            OrderStatus::PickedUp => write!(f, "picked_up"),
            OrderStatus::NoShow => write!(f, "no_show"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shift_id: i64,
    #[schema(example = "2025-01-10")]
    pub date: String,
    pub canteen_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkOrderItem {
    #[schema(example = "2025-01-10")]
    pub date: String,
    pub shift_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkCreateOrderRequest {
    pub items: Vec<BulkOrderItem>,
    pub canteen_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkOrderFailure {
    pub date: String,
    pub shift_id: i64,
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkOrderResponse {
    pub created: Vec<OrderResponse>,
    pub failed: Vec<BulkOrderFailure>,
    pub requested: usize,
    pub created_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckInRequest {
    pub qr_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
    #[schema(example = "2025-01-01")]
    pub start_date: Option<String>,
    #[schema(example = "2025-01-31")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub shift_id: i64,
    pub canteen_id: Option<i64>,
    pub order_date: String,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    /// 取餐码的原始令牌；二维码图片由客户端/网关渲染
    pub qr_token: String,
    pub check_in_at: Option<DateTime<Utc>>,
    pub checked_in_by: Option<i64>,
    pub cancelled_by: Option<i64>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlacklistedSummary {
    pub user_id: i64,
    pub user_name: String,
    pub no_show_count: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SweepReport {
    /// 本次扫描转为未取餐的订单数
    pub processed: u64,
    pub blacklisted: Vec<BlacklistedSummary>,
}

impl From<crate::entities::orders::Model> for OrderResponse {
    fn from(order: crate::entities::orders::Model) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            shift_id: order.shift_id,
            canteen_id: order.canteen_id,
            order_date: order.order_date.format("%Y-%m-%d").to_string(),
            ordered_at: order.ordered_at,
            status: order.status,
            qr_token: order.qr_token,
            check_in_at: order.check_in_at,
            checked_in_by: order.checked_in_by,
            cancelled_by: order.cancelled_by,
            cancel_reason: order.cancel_reason,
        }
    }
}
