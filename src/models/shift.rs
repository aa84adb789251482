use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::shift_window::is_overnight;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateShiftRequest {
    #[schema(example = "午班")]
    pub name: String,
    #[schema(example = "08:00")]
    pub start_time: String,
    #[schema(example = "16:00")]
    pub end_time: String,
    #[schema(example = "11:30")]
    pub break_start_time: Option<String>,
    #[schema(example = "12:30")]
    pub break_end_time: Option<String>,
    /// 餐价（分）
    pub meal_price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateShiftRequest {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub break_start_time: Option<String>,
    pub break_end_time: Option<String>,
    pub is_active: Option<bool>,
    pub meal_price: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShiftListQuery {
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShiftResponse {
    pub id: i64,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub break_start_time: Option<String>,
    pub break_end_time: Option<String>,
    /// 由起止时间推导，不存储
    pub is_overnight: bool,
    pub is_active: bool,
    pub meal_price: i64,
}

impl From<crate::entities::shifts::Model> for ShiftResponse {
    fn from(shift: crate::entities::shifts::Model) -> Self {
        let is_overnight = is_overnight(shift.start_time, shift.end_time);
        Self {
            id: shift.id,
            name: shift.name,
            start_time: shift.start_time.format("%H:%M").to_string(),
            end_time: shift.end_time.format("%H:%M").to_string(),
            break_start_time: shift
                .break_start_time
                .map(|t| t.format("%H:%M").to_string()),
            break_end_time: shift.break_end_time.map(|t| t.format("%H:%M").to_string()),
            is_overnight,
            is_active: shift.is_active,
            meal_price: shift.meal_price,
        }
    }
}
