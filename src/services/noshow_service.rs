use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::{
    blacklist_entity as blacklists, order_entity as orders, shift_entity as shifts,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::events::{AppEvent, EventBroadcaster};
use crate::models::{BlacklistedSummary, OrderPolicy, OrderStatus, SweepReport};
use crate::services::order_rules::shift_has_ended;
use crate::services::settings_service::SettingsService;
use crate::utils::shift_window;
use crate::utils::Clock;

/// Orders older than this many days are outside the sweep's view. One day is
/// enough: no shift spans more than 24 hours, so yesterday's overnight
/// shifts are the oldest that can still be running today.
const LOOKBACK_DAYS: i64 = 1;

#[derive(Clone)]
pub struct NoShowService {
    pool: DatabaseConnection,
    clock: Arc<dyn Clock>,
    settings: SettingsService,
    events: EventBroadcaster,
}

struct StrikeOutcome {
    user: users::Model,
    new_blacklist: Option<blacklists::Model>,
}

impl NoShowService {
    pub fn new(
        pool: DatabaseConnection,
        clock: Arc<dyn Clock>,
        settings: SettingsService,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            pool,
            clock,
            settings,
            events,
        }
    }

    /// Flip every ORDERED order whose shift has strictly ended into NO_SHOW,
    /// record a strike per order, and open a blacklist entry once the strike
    /// threshold is crossed. Best-effort: one order's failure is logged and
    /// the rest of the batch proceeds.
    pub async fn run_sweep(&self) -> AppResult<SweepReport> {
        let policy = self.settings.policy().await?;
        let now = self.clock.now();
        let today = self.clock.today();
        let lookback_start = today - Duration::days(LOOKBACK_DAYS);

        let candidates = orders::Entity::find()
            .filter(orders::Column::Status.eq(OrderStatus::Ordered))
            .filter(orders::Column::OrderDate.between(lookback_start, today))
            .all(&self.pool)
            .await?;

        let shift_ids: HashSet<i64> = candidates.iter().map(|o| o.shift_id).collect();
        let shift_map: HashMap<i64, shifts::Model> = shifts::Entity::find()
            .filter(shifts::Column::Id.is_in(shift_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut processed = 0u64;
        let mut blacklisted: Vec<BlacklistedSummary> = Vec::new();

        for order in candidates {
            let Some(shift) = shift_map.get(&order.shift_id) else {
                log::warn!("Order {} references missing shift {}", order.id, order.shift_id);
                continue;
            };
            let window = shift_window::resolve(
                order.order_date,
                shift.start_time,
                shift.end_time,
                shift.break_times(),
                *now.offset(),
            );
            // 班次还在进行中的订单绝不判定，必须严格晚于结束时刻
            if !shift_has_ended(&window, now) {
                continue;
            }

            let flipped = match self.mark_no_show(order.id, now).await {
                Ok(flipped) => flipped,
                Err(e) => {
                    log::error!("Failed to mark order {} as no-show: {e:?}", order.id);
                    continue;
                }
            };
            if !flipped {
                // 输给并发取餐
                continue;
            }
            processed += 1;

            // 记一次爽约并判定黑名单；失败不回滚已提交的 NO_SHOW 状态
            match self.record_strike(order.user_id, &policy, now).await {
                Ok(outcome) => {
                    self.events.emit(AppEvent::OrderNoShow {
                        order_id: order.id,
                        user_id: outcome.user.id,
                        user_name: outcome.user.username.clone(),
                        no_show_count: outcome.user.no_show_count,
                    });
                    if let Some(entry) = outcome.new_blacklist {
                        log::info!(
                            "User {} blacklisted after {} no-shows (until {:?})",
                            outcome.user.id,
                            outcome.user.no_show_count,
                            entry.end_date
                        );
                        self.events.emit(AppEvent::UserBlacklisted {
                            user_id: outcome.user.id,
                            user_name: outcome.user.username.clone(),
                            no_show_count: outcome.user.no_show_count,
                        });
                        blacklisted.push(BlacklistedSummary {
                            user_id: outcome.user.id,
                            user_name: outcome.user.username,
                            no_show_count: outcome.user.no_show_count,
                        });
                    }
                }
                Err(e) => {
                    log::error!(
                        "Failed to record strike for user {} (order {}): {e:?}",
                        order.user_id,
                        order.id
                    );
                }
            }
        }

        if processed > 0 {
            log::info!("No-show sweep processed {processed} orders");
        }
        Ok(SweepReport {
            processed,
            blacklisted,
        })
    }

    /// Conditional flip; returns false when a concurrent check-in won.
    async fn mark_no_show(&self, order_id: i64, now: DateTime<FixedOffset>) -> AppResult<bool> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::NoShow))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Some(now.to_utc())))
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::Status.eq(OrderStatus::Ordered))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Strike increment and blacklist decision form one atomic unit per
    /// user, so concurrent sweep runs cannot double-create entries.
    async fn record_strike(
        &self,
        user_id: i64,
        policy: &OrderPolicy,
        now: DateTime<FixedOffset>,
    ) -> AppResult<StrikeOutcome> {
        let now_utc = now.to_utc();
        let txn = self.pool.begin().await?;

        users::Entity::update_many()
            .col_expr(
                users::Column::NoShowCount,
                Expr::col(users::Column::NoShowCount).add(1),
            )
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        let mut new_blacklist = None;
        if user.no_show_count >= policy.blacklist_strikes {
            let already_active = blacklists::Entity::find()
                .filter(blacklists::Column::UserId.eq(user_id))
                .filter(crate::services::blacklist_service::active_condition(
                    now_utc,
                ))
                .one(&txn)
                .await?;
            if already_active.is_none() {
                let entry = blacklists::ActiveModel {
                    user_id: Set(user_id),
                    reason: Set(format!(
                        "Accumulated {} unclaimed meal reservations",
                        user.no_show_count
                    )),
                    start_date: Set(now_utc),
                    // 自动处理总是带截止时间，无限期只能人工录入
                    end_date: Set(Some(
                        now_utc + Duration::days(policy.blacklist_duration_days),
                    )),
                    is_active: Set(true),
                    created_by: Set(None),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                new_blacklist = Some(entry);
            }
        }

        txn.commit().await?;
        Ok(StrikeOutcome {
            user,
            new_blacklist,
        })
    }
}
