use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::blacklist_entity as blacklists;
use crate::error::{AppError, AppResult};
use crate::models::{BlacklistQuery, BlacklistResponse, CreateBlacklistRequest};
use crate::utils::local_date::parse_local_date;
use crate::utils::pagination::{PaginatedResponse, PaginationParams};
use crate::utils::Clock;

/// A blacklist row is only effective while `is_active` is set AND its end
/// date (if any) lies in the future. Every read applies this predicate; the
/// physical sweep merely keeps the table small and the two can never
/// disagree.
pub fn is_effectively_active(entry: &blacklists::Model, now: DateTime<Utc>) -> bool {
    entry.is_active && entry.end_date.map_or(true, |end| end > now)
}

/// Query form of the lazy predicate; keep in sync with
/// `is_effectively_active`.
pub fn active_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(blacklists::Column::IsActive.eq(true))
        .add(
            Condition::any()
                .add(blacklists::Column::EndDate.is_null())
                .add(blacklists::Column::EndDate.gt(now)),
        )
}

#[derive(Clone)]
pub struct BlacklistService {
    pool: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl BlacklistService {
    pub fn new(pool: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// The user's effectively active suspension, if any.
    pub async fn find_active_for_user(&self, user_id: i64) -> AppResult<Option<blacklists::Model>> {
        let now = self.clock.now().to_utc();
        Ok(blacklists::Entity::find()
            .filter(blacklists::Column::UserId.eq(user_id))
            .filter(active_condition(now))
            .one(&self.pool)
            .await?)
    }

    pub async fn list(
        &self,
        query: &BlacklistQuery,
    ) -> AppResult<PaginatedResponse<BlacklistResponse>> {
        let now = self.clock.now().to_utc();
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = blacklists::Entity::find();
        if query.active_only.unwrap_or(false) {
            base = base.filter(active_condition(now));
        }

        let total = base.clone().count(&self.pool).await? as i64;
        let models = base
            .order_by_desc(blacklists::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items = models
            .into_iter()
            .map(|m| self.to_response(m, now))
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// Manual suspension entered by an administrator. The automatic no-show
    /// path always sets an end date; only this path may leave it open-ended.
    pub async fn create_manual(
        &self,
        req: CreateBlacklistRequest,
        actor_id: i64,
    ) -> AppResult<blacklists::Model> {
        let now = self.clock.now().to_utc();
        if self.find_active_for_user(req.user_id).await?.is_some() {
            return Err(AppError::ValidationError(
                "User already has an active blacklist entry".into(),
            ));
        }
        let end_date = match &req.end_date {
            Some(raw) => {
                let date = parse_local_date(raw).ok_or_else(|| {
                    AppError::ValidationError(format!("Invalid end date '{raw}'"))
                })?;
                let end = crate::utils::local_date::at_local(
                    date,
                    chrono::NaiveTime::MIN,
                    *self.clock.now().offset(),
                )
                .to_utc();
                if end <= now {
                    return Err(AppError::ValidationError(
                        "End date must be in the future".into(),
                    ));
                }
                Some(end)
            }
            None => None,
        };

        let entry = blacklists::ActiveModel {
            user_id: Set(req.user_id),
            reason: Set(req.reason),
            start_date: Set(now),
            end_date: Set(end_date),
            is_active: Set(true),
            created_by: Set(Some(actor_id)),
            ..Default::default()
        };
        Ok(entry.insert(&self.pool).await?)
    }

    /// Lift a suspension early.
    pub async fn deactivate(&self, id: i64) -> AppResult<BlacklistResponse> {
        let now = self.clock.now().to_utc();
        let entry = blacklists::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Blacklist entry not found".into()))?;
        let mut am = entry.into_active_model();
        am.is_active = Set(false);
        let updated = am.update(&self.pool).await?;
        Ok(self.to_response(updated, now))
    }

    /// Physically flip expired rows. Reads never depend on this having run.
    pub async fn expire_sweep(&self) -> AppResult<u64> {
        let now = self.clock.now().to_utc();
        let result = blacklists::Entity::update_many()
            .col_expr(blacklists::Column::IsActive, Expr::value(false))
            .filter(blacklists::Column::IsActive.eq(true))
            .filter(blacklists::Column::EndDate.is_not_null())
            .filter(blacklists::Column::EndDate.lte(now))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }

    fn to_response(&self, m: blacklists::Model, now: DateTime<Utc>) -> BlacklistResponse {
        let effective = is_effectively_active(&m, now);
        BlacklistResponse {
            id: m.id,
            user_id: m.user_id,
            reason: m.reason,
            start_date: m.start_date,
            end_date: m.end_date,
            is_active: effective,
            created_by: m.created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(
        is_active: bool,
        end_date: Option<DateTime<Utc>>,
    ) -> blacklists::Model {
        blacklists::Model {
            id: 1,
            user_id: 1,
            reason: "test".into(),
            start_date: Utc::now() - Duration::days(1),
            end_date,
            is_active,
            created_by: None,
            created_at: None,
        }
    }

    #[test]
    fn active_row_with_future_end_is_effective() {
        let now = Utc::now();
        assert!(is_effectively_active(
            &entry(true, Some(now + Duration::days(5))),
            now
        ));
    }

    #[test]
    fn indefinite_row_stays_effective() {
        let now = Utc::now();
        assert!(is_effectively_active(&entry(true, None), now));
    }

    #[test]
    fn expired_row_is_inactive_even_before_sweep() {
        // 数据库里的 is_active 仍是 true，但懒判定已经失效
        let now = Utc::now();
        assert!(!is_effectively_active(
            &entry(true, Some(now - Duration::seconds(1))),
            now
        ));
        // 恰好等于 end_date 也视为已失效
        assert!(!is_effectively_active(&entry(true, Some(now)), now));
    }

    #[test]
    fn deactivated_row_is_never_effective() {
        let now = Utc::now();
        assert!(!is_effectively_active(
            &entry(false, Some(now + Duration::days(5))),
            now
        ));
        assert!(!is_effectively_active(&entry(false, None), now));
    }
}
