use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::entities::{
    canteen_entity as canteens, holiday_entity as holidays, order_entity as orders,
    shift_entity as shifts, user_entity as users,
};
use crate::error::{AppError, AppResult, OrderRejection};
use crate::events::{AppEvent, EventBroadcaster};
use crate::models::{
    BulkCreateOrderRequest, BulkOrderFailure, BulkOrderResponse, CancelOrderRequest,
    CreateOrderRequest, OrderQuery, OrderResponse, OrderStatus, UserRole,
};
use crate::services::blacklist_service::BlacklistService;
use crate::services::order_rules::{self, OrderLookups, OrderRuleContext};
use crate::services::settings_service::SettingsService;
use crate::utils::cutoff::CutoffPolicy;
use crate::utils::local_date::parse_local_date;
use crate::utils::pagination::{PaginatedResponse, PaginationParams};
use crate::utils::{generate_qr_token, Clock, RateLimiter};

/// Hard cap on candidates per bulk request.
pub const MAX_BULK_ORDERS: usize = 30;

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
    clock: Arc<dyn Clock>,
    settings: SettingsService,
    blacklist: BlacklistService,
    events: EventBroadcaster,
    rate_limiter: Arc<RateLimiter>,
}

impl OrderService {
    pub fn new(
        pool: DatabaseConnection,
        clock: Arc<dyn Clock>,
        settings: SettingsService,
        blacklist: BlacklistService,
        events: EventBroadcaster,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            pool,
            clock,
            settings,
            blacklist,
            events,
            rate_limiter,
        }
    }

    /// Create one reservation after the full validation pipeline.
    pub async fn create_order(
        &self,
        user_id: i64,
        req: CreateOrderRequest,
    ) -> AppResult<OrderResponse> {
        let policy = self.settings.policy().await?;
        let now = self.clock.now();
        let today = self.clock.today();

        // 拉黑用户直接拒绝
        let active_blacklist = self.blacklist.find_active_for_user(user_id).await?;
        order_rules::check_not_blacklisted(active_blacklist.as_ref())?;

        // 日期先行解析，点查依赖它；管道内会按固定顺序重跑全部检查
        let date = parse_local_date(&req.date)
            .ok_or_else(|| OrderRejection::InvalidDate(req.date.clone()))?;

        let existing: HashSet<NaiveDate> = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .filter(orders::Column::OrderDate.eq(date))
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|o| o.order_date)
            .collect();
        let holiday_rows = holidays::Entity::find()
            .filter(holidays::Column::Date.eq(date))
            .all(&self.pool)
            .await?;
        let shift_map: HashMap<i64, shifts::Model> = shifts::Entity::find_by_id(req.shift_id)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let ctx = OrderRuleContext {
            policy: &policy,
            today,
            now,
        };
        let lookups = OrderLookups {
            existing_dates: &existing,
            holidays: &holiday_rows,
            shifts: &shift_map,
        };
        order_rules::validate_candidate(&ctx, &lookups, &req.date, req.shift_id)?;

        // 食堂容量（可选，委托给容量计数）
        if let Some(canteen_id) = req.canteen_id {
            self.check_capacity(canteen_id, req.shift_id, date).await?;
        }

        let model = self
            .insert_order(user_id, req.shift_id, req.canteen_id, date)
            .await?;
        let response = OrderResponse::from(model);
        self.events.emit(AppEvent::OrderCreated {
            order: response.clone(),
        });
        Ok(response)
    }

    /// Validate and create up to `MAX_BULK_ORDERS` candidates for one user.
    ///
    /// Phase 1 pre-fetches everything the per-candidate checks read, in one
    /// query per concern; phase 2 validates against those lookups only and
    /// commits each accepted row independently, so one rejected candidate
    /// never drags down the rest.
    pub async fn create_bulk_orders(
        &self,
        user_id: i64,
        req: BulkCreateOrderRequest,
    ) -> AppResult<BulkOrderResponse> {
        // 反复被整批拒绝的提交按用户限流；单个候选失败不计
        let limiter_key = format!("bulk:user:{user_id}");
        if !self.rate_limiter.check(&limiter_key) {
            return Err(AppError::RateLimited(
                "Too many rejected bulk requests, try again later".into(),
            ));
        }
        let user = match self.bulk_preconditions(user_id, &req).await {
            Ok(user) => user,
            Err(e) => {
                self.rate_limiter.record_failure(&limiter_key);
                return Err(e);
            }
        };
        self.rate_limiter.reset(&limiter_key);

        let policy = self.settings.policy().await?;
        let now = self.clock.now();
        let today = self.clock.today();

        // 第一阶段：按日期区间和班次集合各取一次
        let parsed_dates: Vec<NaiveDate> = req
            .items
            .iter()
            .filter_map(|item| parse_local_date(&item.date))
            .collect();

        let mut existing_dates: HashSet<NaiveDate> = HashSet::new();
        let mut holiday_rows: Vec<holidays::Model> = Vec::new();
        let mut shift_map: HashMap<i64, shifts::Model> = HashMap::new();

        if let (Some(&min_date), Some(&max_date)) =
            (parsed_dates.iter().min(), parsed_dates.iter().max())
        {
            existing_dates = orders::Entity::find()
                .filter(orders::Column::UserId.eq(user.id))
                .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
                .filter(orders::Column::OrderDate.between(min_date, max_date))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|o| o.order_date)
                .collect();
            holiday_rows = holidays::Entity::find()
                .filter(holidays::Column::Date.between(min_date, max_date))
                .all(&self.pool)
                .await?;
            let shift_ids: HashSet<i64> = req.items.iter().map(|item| item.shift_id).collect();
            shift_map = shifts::Entity::find()
                .filter(shifts::Column::Id.is_in(shift_ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect();
        }

        // 第二阶段：逐候选校验，只读内存结构；每行独立提交
        let mut created: Vec<OrderResponse> = Vec::new();
        let mut failed: Vec<BulkOrderFailure> = Vec::new();

        for item in &req.items {
            let verdict = {
                let ctx = OrderRuleContext {
                    policy: &policy,
                    today,
                    now,
                };
                let lookups = OrderLookups {
                    existing_dates: &existing_dates,
                    holidays: &holiday_rows,
                    shifts: &shift_map,
                };
                order_rules::validate_candidate(&ctx, &lookups, &item.date, item.shift_id)
            };
            let date = match verdict {
                Ok(date) => date,
                Err(rejection) => {
                    failed.push(BulkOrderFailure {
                        date: item.date.clone(),
                        shift_id: item.shift_id,
                        code: rejection.code().to_string(),
                        reason: rejection.to_string(),
                    });
                    continue;
                }
            };

            match self
                .insert_order(user.id, item.shift_id, req.canteen_id, date)
                .await
            {
                Ok(model) => {
                    // 同批内同一天的后续候选按重复处理
                    existing_dates.insert(date);
                    created.push(OrderResponse::from(model));
                }
                Err(AppError::OrderRejected(rejection)) => {
                    failed.push(BulkOrderFailure {
                        date: item.date.clone(),
                        shift_id: item.shift_id,
                        code: rejection.code().to_string(),
                        reason: rejection.to_string(),
                    });
                }
                Err(e) => {
                    // 单行写失败不拖垮整批
                    log::error!(
                        "Bulk order write failed for user {} on {}: {e:?}",
                        user.id,
                        item.date
                    );
                    failed.push(BulkOrderFailure {
                        date: item.date.clone(),
                        shift_id: item.shift_id,
                        code: "INTERNAL_ERROR".to_string(),
                        reason: "Order could not be stored".to_string(),
                    });
                }
            }
        }

        if !created.is_empty() {
            self.events.emit(AppEvent::OrderBulkCreated {
                count: created.len(),
                user_id: user.id,
            });
        }

        let requested = req.items.len();
        let created_count = created.len();
        Ok(BulkOrderResponse {
            created,
            failed,
            requested,
            created_count,
        })
    }

    /// Cancel an ORDERED reservation before its cutoff. Final, no undo.
    pub async fn cancel_order(
        &self,
        order_id: i64,
        actor_id: i64,
        actor_role: UserRole,
        req: CancelOrderRequest,
    ) -> AppResult<OrderResponse> {
        let order = orders::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

        if order.user_id != actor_id && actor_role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }

        match order.status {
            OrderStatus::Ordered => {}
            OrderStatus::Cancelled => return Err(OrderRejection::AlreadyCancelled.into()),
            OrderStatus::PickedUp | OrderStatus::NoShow => {
                return Err(OrderRejection::NotCancellable(order.status.to_string()).into());
            }
        }

        let shift = shifts::Entity::find_by_id(order.shift_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Shift not found".into()))?;

        // 取消沿用下单同一截单时刻
        let policy = self.settings.policy().await?;
        let now = self.clock.now();
        CutoffPolicy::new(&policy).check_cancel_cutoff(order.order_date, shift.start_time, now)?;

        // 条件更新：状态已变则竞态输掉，按当前状态报告
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::Cancelled))
            .col_expr(orders::Column::CancelledBy, Expr::value(actor_id))
            .col_expr(orders::Column::CancelReason, Expr::value(req.reason))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Some(now.to_utc())))
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::Status.eq(OrderStatus::Ordered))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            return Err(self.report_lost_race(order_id).await?);
        }

        let updated = self.reload_order(order_id).await?;
        let response = OrderResponse::from(updated);
        self.events.emit(AppEvent::OrderCancelled {
            order: response.clone(),
        });
        Ok(response)
    }

    pub async fn get_user_orders(
        &self,
        user_id: i64,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = orders::Entity::find().filter(orders::Column::UserId.eq(user_id));
        if let Some(status) = query.status {
            base = base.filter(orders::Column::Status.eq(status));
        }
        if let Some(raw) = &query.start_date {
            let date = parse_local_date(raw)
                .ok_or_else(|| OrderRejection::InvalidDate(raw.clone()))?;
            base = base.filter(orders::Column::OrderDate.gte(date));
        }
        if let Some(raw) = &query.end_date {
            let date = parse_local_date(raw)
                .ok_or_else(|| OrderRejection::InvalidDate(raw.clone()))?;
            base = base.filter(orders::Column::OrderDate.lte(date));
        }

        let total = base.clone().count(&self.pool).await? as i64;
        let models = base
            .order_by_desc(orders::Column::OrderDate)
            .order_by_desc(orders::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<OrderResponse> = models.into_iter().map(OrderResponse::from).collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// Request-level preconditions of the bulk planner: list bounds, user
    /// existence, and the user-level blacklist gate. Anything failing here
    /// aborts before the phase-1 pre-fetch.
    async fn bulk_preconditions(
        &self,
        user_id: i64,
        req: &BulkCreateOrderRequest,
    ) -> AppResult<users::Model> {
        if req.items.is_empty() {
            return Err(AppError::ValidationError(
                "No order candidates provided".into(),
            ));
        }
        if req.items.len() > MAX_BULK_ORDERS {
            return Err(AppError::ValidationError(format!(
                "At most {MAX_BULK_ORDERS} candidates per request"
            )));
        }
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        // 拉黑是用户级前置条件，整批拒绝
        let active_blacklist = self.blacklist.find_active_for_user(user.id).await?;
        order_rules::check_not_blacklisted(active_blacklist.as_ref())?;
        Ok(user)
    }

    async fn insert_order(
        &self,
        user_id: i64,
        shift_id: i64,
        canteen_id: Option<i64>,
        date: NaiveDate,
    ) -> AppResult<orders::Model> {
        let now = self.clock.now();
        let order = orders::ActiveModel {
            user_id: Set(user_id),
            shift_id: Set(shift_id),
            canteen_id: Set(canteen_id),
            order_date: Set(date),
            ordered_at: Set(now.to_utc()),
            status: Set(OrderStatus::Ordered),
            qr_token: Set(generate_qr_token()),
            ..Default::default()
        };
        order
            .insert(&self.pool)
            .await
            .map_err(|e| Self::translate_insert_error(e, date))
    }

    /// The duplicate pre-check races with concurrent creates; the partial
    /// unique index on (user_id, order_date) is the authority, and losing
    /// that race is reported as a duplicate, never as a generic failure.
    fn translate_insert_error(err: DbErr, date: NaiveDate) -> AppError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                OrderRejection::DuplicateOrder(date).into()
            }
            _ => AppError::DatabaseError(err),
        }
    }

    async fn check_capacity(
        &self,
        canteen_id: i64,
        shift_id: i64,
        date: NaiveDate,
    ) -> AppResult<()> {
        let canteen = canteens::Entity::find_by_id(canteen_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Canteen not found".into()))?;
        if !canteen.is_active {
            return Err(AppError::ValidationError("Canteen is not active".into()));
        }
        let Some(capacity) = canteen.capacity else {
            return Ok(());
        };
        let taken = orders::Entity::find()
            .filter(orders::Column::CanteenId.eq(canteen_id))
            .filter(orders::Column::ShiftId.eq(shift_id))
            .filter(orders::Column::OrderDate.eq(date))
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
            .count(&self.pool)
            .await?;
        if taken >= capacity as u64 {
            return Err(OrderRejection::CapacityExceeded(date).into());
        }
        Ok(())
    }

    async fn report_lost_race(&self, order_id: i64) -> AppResult<AppError> {
        let current = self.reload_order(order_id).await?;
        Ok(match current.status {
            OrderStatus::Cancelled => OrderRejection::AlreadyCancelled.into(),
            OrderStatus::PickedUp => OrderRejection::NotCancellable("picked_up".into()).into(),
            status => OrderRejection::NotCancellable(status.to_string()).into(),
        })
    }

    async fn reload_order(&self, order_id: i64) -> AppResult<orders::Model> {
        orders::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Order {order_id} disappeared")))
    }
}
