use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateHolidayRequest {
    #[schema(example = "元旦")]
    pub name: String,
    #[schema(example = "2025-01-01")]
    pub date: String,
    /// 为空表示全天停餐
    pub shift_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HolidayResponse {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub shift_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HolidayQuery {
    #[schema(example = "2025-01-01")]
    pub start_date: Option<String>,
    #[schema(example = "2025-12-31")]
    pub end_date: Option<String>,
}

impl From<crate::entities::holidays::Model> for HolidayResponse {
    fn from(holiday: crate::entities::holidays::Model) -> Self {
        Self {
            id: holiday.id,
            name: holiday.name,
            date: holiday.date.format("%Y-%m-%d").to_string(),
            shift_id: holiday.shift_id,
        }
    }
}
