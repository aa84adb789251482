use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{holiday_entity as holidays, shift_entity as shifts};
use crate::error::{AppError, AppResult};
use crate::models::{CreateHolidayRequest, HolidayQuery, HolidayResponse};
use crate::utils::local_date::parse_local_date;

#[derive(Clone)]
pub struct HolidayService {
    pool: DatabaseConnection,
}

impl HolidayService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &HolidayQuery) -> AppResult<Vec<HolidayResponse>> {
        let mut base = holidays::Entity::find();
        if let Some(raw) = &query.start_date {
            let date = parse_local_date(raw)
                .ok_or_else(|| AppError::ValidationError(format!("Invalid start date '{raw}'")))?;
            base = base.filter(holidays::Column::Date.gte(date));
        }
        if let Some(raw) = &query.end_date {
            let date = parse_local_date(raw)
                .ok_or_else(|| AppError::ValidationError(format!("Invalid end date '{raw}'")))?;
            base = base.filter(holidays::Column::Date.lte(date));
        }
        let models = base
            .order_by_asc(holidays::Column::Date)
            .all(&self.pool)
            .await?;
        Ok(models.into_iter().map(HolidayResponse::from).collect())
    }

    pub async fn create(&self, req: CreateHolidayRequest) -> AppResult<HolidayResponse> {
        if req.name.trim().is_empty() {
            return Err(AppError::ValidationError("Holiday name is required".into()));
        }
        let date = parse_local_date(&req.date)
            .ok_or_else(|| AppError::ValidationError(format!("Invalid date '{}'", req.date)))?;

        // 指定班次的停餐必须指向存在的班次
        if let Some(shift_id) = req.shift_id {
            shifts::Entity::find_by_id(shift_id)
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Shift not found".into()))?;
        }

        let holiday = holidays::ActiveModel {
            name: Set(req.name.trim().to_string()),
            date: Set(date),
            shift_id: Set(req.shift_id),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        Ok(HolidayResponse::from(holiday.insert(&self.pool).await?))
    }

    pub async fn delete(&self, holiday_id: i64) -> AppResult<()> {
        let holiday = holidays::Entity::find_by_id(holiday_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Holiday not found".into()))?;
        holiday.delete(&self.pool).await?;
        Ok(())
    }
}
