use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBlacklistRequest {
    pub user_id: i64,
    #[schema(example = "多次未取餐")]
    pub reason: String,
    /// 截止日期（YYYY-MM-DD）；为空表示无限期
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlacklistResponse {
    pub id: i64,
    pub user_id: i64,
    pub reason: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// 懒失效判定后的有效状态，而非数据库里的原始标记
    pub is_active: bool,
    pub created_by: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlacklistQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub active_only: Option<bool>,
}
