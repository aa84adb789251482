use chrono::{NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::shift_entity as shifts;
use crate::error::{AppError, AppResult};
use crate::models::{CreateShiftRequest, ShiftResponse, UpdateShiftRequest};
use crate::utils::local_date::parse_hhmm;

#[derive(Clone)]
pub struct ShiftService {
    pool: DatabaseConnection,
}

fn parse_time_field(raw: &str, field: &str) -> AppResult<NaiveTime> {
    parse_hhmm(raw)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid {field} '{raw}', expected HH:mm")))
}

fn validate_break_pair(
    start: &Option<NaiveTime>,
    end: &Option<NaiveTime>,
) -> AppResult<()> {
    match (start, end) {
        (Some(_), Some(_)) | (None, None) => Ok(()),
        _ => Err(AppError::ValidationError(
            "Break start and end must be set together".into(),
        )),
    }
}

impl ShiftService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<ShiftResponse>> {
        let mut query = shifts::Entity::find();
        if !include_inactive {
            query = query.filter(shifts::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_asc(shifts::Column::StartTime)
            .all(&self.pool)
            .await?;
        Ok(models.into_iter().map(ShiftResponse::from).collect())
    }

    pub async fn create(&self, req: CreateShiftRequest) -> AppResult<ShiftResponse> {
        if req.name.trim().is_empty() {
            return Err(AppError::ValidationError("Shift name is required".into()));
        }
        let start_time = parse_time_field(&req.start_time, "start time")?;
        let end_time = parse_time_field(&req.end_time, "end time")?;
        let break_start = req
            .break_start_time
            .as_deref()
            .map(|raw| parse_time_field(raw, "break start time"))
            .transpose()?;
        let break_end = req
            .break_end_time
            .as_deref()
            .map(|raw| parse_time_field(raw, "break end time"))
            .transpose()?;
        validate_break_pair(&break_start, &break_end)?;
        if req.meal_price < 0 {
            return Err(AppError::ValidationError(
                "Meal price must not be negative".into(),
            ));
        }

        let shift = shifts::ActiveModel {
            name: Set(req.name.trim().to_string()),
            start_time: Set(start_time),
            end_time: Set(end_time),
            break_start_time: Set(break_start),
            break_end_time: Set(break_end),
            is_active: Set(true),
            meal_price: Set(req.meal_price),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        Ok(ShiftResponse::from(shift.insert(&self.pool).await?))
    }

    pub async fn update(&self, shift_id: i64, req: UpdateShiftRequest) -> AppResult<ShiftResponse> {
        let current = shifts::Entity::find_by_id(shift_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Shift not found".into()))?;

        let break_start = match &req.break_start_time {
            Some(raw) => Some(parse_time_field(raw, "break start time")?),
            None => current.break_start_time,
        };
        let break_end = match &req.break_end_time {
            Some(raw) => Some(parse_time_field(raw, "break end time")?),
            None => current.break_end_time,
        };
        validate_break_pair(&break_start, &break_end)?;

        let mut am = current.into_active_model();
        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(AppError::ValidationError("Shift name is required".into()));
            }
            am.name = Set(name.trim().to_string());
        }
        if let Some(raw) = &req.start_time {
            am.start_time = Set(parse_time_field(raw, "start time")?);
        }
        if let Some(raw) = &req.end_time {
            am.end_time = Set(parse_time_field(raw, "end time")?);
        }
        if req.break_start_time.is_some() {
            am.break_start_time = Set(break_start);
        }
        if req.break_end_time.is_some() {
            am.break_end_time = Set(break_end);
        }
        if let Some(is_active) = req.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(price) = req.meal_price {
            if price < 0 {
                return Err(AppError::ValidationError(
                    "Meal price must not be negative".into(),
                ));
            }
            am.meal_price = Set(price);
        }
        am.updated_at = Set(Some(Utc::now()));
        Ok(ShiftResponse::from(am.update(&self.pool).await?))
    }
}
