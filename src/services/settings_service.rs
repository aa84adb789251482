use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set,
};

use crate::entities::settings_entity as settings;
use crate::error::{AppError, AppResult};
use crate::models::{CutoffMode, OrderPolicy, UpdateSettingsRequest};

/// Owner of the singleton settings row. Policy decisions never read this
/// table directly; they receive an `OrderPolicy` snapshot instead.
#[derive(Clone)]
pub struct SettingsService {
    pool: DatabaseConnection,
}

impl SettingsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Fetch the settings row, creating the default one on first use.
    pub async fn get(&self) -> AppResult<settings::Model> {
        if let Some(model) = settings::Entity::find()
            .order_by_asc(settings::Column::Id)
            .one(&self.pool)
            .await?
        {
            return Ok(model);
        }

        // 首次启动：写入默认配置
        let defaults = settings::ActiveModel {
            cutoff_mode: Set(CutoffMode::PerShift),
            cutoff_days: Set(0),
            cutoff_hours: Set(12),
            weekly_cutoff_weekday: Set(5),
            weekly_cutoff_hour: Set(17),
            weekly_cutoff_minute: Set(0),
            orderable_weekdays: Set("1,2,3,4,5".to_string()),
            max_weeks_ahead: Set(2),
            max_order_days_ahead: Set(14),
            blacklist_strikes: Set(3),
            blacklist_duration_days: Set(30),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        Ok(defaults.insert(&self.pool).await?)
    }

    /// Snapshot the current policy for one request or sweep run.
    pub async fn policy(&self) -> AppResult<OrderPolicy> {
        let model = self.get().await?;
        Ok(OrderPolicy::from_settings(&model))
    }

    pub async fn update(&self, req: UpdateSettingsRequest) -> AppResult<settings::Model> {
        if let Some(weekday) = req.weekly_cutoff_weekday
            && !(1..=7).contains(&weekday)
        {
            return Err(AppError::ValidationError(
                "weekly_cutoff_weekday must be 1-7".into(),
            ));
        }
        if let Some(hour) = req.weekly_cutoff_hour
            && !(0..=23).contains(&hour)
        {
            return Err(AppError::ValidationError(
                "weekly_cutoff_hour must be 0-23".into(),
            ));
        }
        if let Some(minute) = req.weekly_cutoff_minute
            && !(0..=59).contains(&minute)
        {
            return Err(AppError::ValidationError(
                "weekly_cutoff_minute must be 0-59".into(),
            ));
        }
        if let Some(days) = &req.orderable_weekdays
            && crate::models::parse_weekday_set(days).is_empty()
        {
            return Err(AppError::ValidationError(
                "orderable_weekdays must name at least one ISO weekday".into(),
            ));
        }
        for (name, value) in [
            ("cutoff_days", req.cutoff_days),
            ("cutoff_hours", req.cutoff_hours),
            ("max_weeks_ahead", req.max_weeks_ahead),
            ("max_order_days_ahead", req.max_order_days_ahead),
            ("blacklist_strikes", req.blacklist_strikes),
            ("blacklist_duration_days", req.blacklist_duration_days),
        ] {
            if let Some(v) = value
                && v < 0
            {
                return Err(AppError::ValidationError(format!(
                    "{name} must not be negative"
                )));
            }
        }

        let current = self.get().await?;
        let mut am = current.into_active_model();
        if let Some(v) = req.cutoff_mode {
            am.cutoff_mode = Set(v);
        }
        if let Some(v) = req.cutoff_days {
            am.cutoff_days = Set(v);
        }
        if let Some(v) = req.cutoff_hours {
            am.cutoff_hours = Set(v);
        }
        if let Some(v) = req.weekly_cutoff_weekday {
            am.weekly_cutoff_weekday = Set(v);
        }
        if let Some(v) = req.weekly_cutoff_hour {
            am.weekly_cutoff_hour = Set(v);
        }
        if let Some(v) = req.weekly_cutoff_minute {
            am.weekly_cutoff_minute = Set(v);
        }
        if let Some(v) = req.orderable_weekdays {
            am.orderable_weekdays = Set(v);
        }
        if let Some(v) = req.max_weeks_ahead {
            am.max_weeks_ahead = Set(v);
        }
        if let Some(v) = req.max_order_days_ahead {
            am.max_order_days_ahead = Set(v);
        }
        if let Some(v) = req.blacklist_strikes {
            am.blacklist_strikes = Set(v);
        }
        if let Some(v) = req.blacklist_duration_days {
            am.blacklist_duration_days = Set(v);
        }
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(&self.pool).await?)
    }
}
